//! Content similarity over the catalog's combined feature text.
//!
//! Every movie's `combined_features` is turned into a bag-of-words count
//! vector over a vocabulary fitted once on the whole catalog, and the full
//! N x N cosine similarity matrix is computed up front. Building costs
//! O(N² · D) time and N² cells of memory, which bounds the catalog size this
//! engine is meant for.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use thiserror::Error;

use crate::services::catalog::Catalog;

/// Error types for the similarity build
#[derive(Debug, Error, PartialEq)]
pub enum FeatureBuildError {
    #[error("Cannot build similarity: vocabulary is empty across {0} movies")]
    EmptyVocabulary(usize),
}

/// Lowercased tokens made of two or more word characters
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().nth(1).is_some())
        .map(str::to_lowercase)
}

/// Term to column mapping, columns assigned in sorted term order
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: BTreeMap<String, u32>,
}

impl Vocabulary {
    /// Fits a vocabulary over every document
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut terms: BTreeMap<String, u32> = BTreeMap::new();
        for doc in documents {
            for token in tokenize(doc) {
                terms.entry(token).or_insert(0);
            }
        }
        for (column, slot) in terms.values_mut().enumerate() {
            *slot = column as u32;
        }
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Column of a term, if the term was seen during fitting
    pub fn column(&self, term: &str) -> Option<u32> {
        self.terms.get(term).copied()
    }

    /// Count vector of a document; terms outside the vocabulary are ignored
    pub fn vectorize(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(column) = self.column(&token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        SparseVector::from_sorted(counts.into_iter().collect())
    }
}

/// Term counts sorted by column
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, u32)>,
    norm: f64,
}

impl SparseVector {
    fn from_sorted(entries: Vec<(u32, u32)>) -> Self {
        let norm = entries
            .iter()
            .map(|&(_, c)| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt();
        Self { entries, norm }
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_col, a_count) = self.entries[i];
            let (b_col, b_count) = other.entries[j];
            match a_col.cmp(&b_col) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    dot += (a_count as f64) * (b_count as f64);
                    i += 1;
                    j += 1;
                }
            }
        }
        dot
    }

    /// Cosine of the angle between two count vectors, 0.0 if either is empty
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let denom = self.norm * other.norm;
        if denom == 0.0 {
            return 0.0;
        }
        let result = self.dot(other) / denom;
        if !result.is_finite() {
            return 0.0;
        }
        result.clamp(0.0, 1.0)
    }
}

/// Dense, symmetric all-pairs cosine similarity, indexed by catalog index
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    vocabulary_size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Vectorizes the catalog and computes every pairwise score.
    ///
    /// The diagonal is exactly 1.0, including for movies whose features
    /// produced no tokens.
    pub fn build(catalog: &Catalog) -> Result<Self, FeatureBuildError> {
        let documents: Vec<&str> = catalog
            .movies()
            .iter()
            .map(|m| m.combined_features.as_str())
            .collect();

        let vocabulary = Vocabulary::fit(documents.iter().copied());
        if vocabulary.is_empty() {
            return Err(FeatureBuildError::EmptyVocabulary(catalog.len()));
        }

        let vectors: Vec<SparseVector> = documents
            .par_iter()
            .map(|doc| vocabulary.vectorize(doc))
            .collect();

        let size = vectors.len();
        let mut scores = vec![0.0f32; size * size];
        scores
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, cell) in row.iter_mut().enumerate() {
                    *cell = if i == j {
                        1.0
                    } else {
                        vectors[i].cosine(&vectors[j]) as f32
                    };
                }
            });

        tracing::info!(
            movies = size,
            vocabulary = vocabulary.len(),
            "Similarity matrix built"
        );

        Ok(Self {
            size,
            vocabulary_size: vocabulary.len(),
            scores,
        })
    }

    /// Number of movies covered
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Similarity between two catalog indices
    pub fn score(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.scores[i * self.size + j] as f64)
    }

    /// Other movies ranked by similarity to `seed`.
    ///
    /// Score descending, ties by ascending index. The seed itself is never
    /// included. At most `limit` entries; empty for an out-of-range seed.
    pub fn similar_to(&self, seed: usize, limit: usize) -> Vec<(usize, f64)> {
        if seed >= self.size {
            return Vec::new();
        }

        let row = &self.scores[seed * self.size..(seed + 1) * self.size];
        let mut ranked: Vec<(usize, f32)> = row
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != seed)
            .map(|(j, &score)| (j, score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);

        ranked
            .into_iter()
            .map(|(j, score)| (j, score as f64))
            .collect()
    }
}
