use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Stable identifier of a movie in the source dataset (e.g. "tt0133093")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub String);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One deduplicated row of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    /// Dense position in the catalog, also the coordinate into the similarity matrix
    pub index: usize,
    pub title: String,
    /// Genre tags in source order, without duplicates
    pub genres: Vec<String>,
    /// The single studio association retained after deduplication
    pub studio: Option<String>,
    pub rating: f64,
    pub year: i32,
    pub runtime_minutes: Option<u32>,
    /// Raw path fragment, resolving it to a URL is up to the caller
    pub poster_path: Option<String>,
    pub combined_features: String,
}

impl Movie {
    /// True if the movie carries at least one of the given genre tags
    pub fn has_any_genre<'a, I>(&self, wanted: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        wanted.into_iter().any(|g| self.genres.contains(g))
    }
}
