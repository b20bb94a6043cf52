use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogInfo, MovieCard, MovieFilter, MovieId, MoviePage, Page, StudioOptions},
    services::{
        catalog::{Catalog, CatalogSource},
        features,
        query::{self, MovieQuery},
        similarity::SimilarityMatrix,
    },
};

/// Seed title lookup failed
#[derive(Debug, Error, PartialEq)]
#[error("Unknown title: {0}")]
pub struct UnknownTitleError(pub String);

/// A recommended movie and its similarity to the seed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: MovieCard,
    pub score: f64,
}

/// Similarity-ranked movies for one seed, after filtering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    pub seed: MovieCard,
    pub movies: Vec<ScoredMovie>,
}

/// One immutable catalog snapshot and everything derived from it
struct Snapshot {
    catalog: Arc<Catalog>,
    genres: Vec<String>,
    studios: StudioOptions,
    source: String,
    loaded_at: DateTime<Utc>,
    /// Built on first use, at most once per snapshot
    similarity: OnceCell<Arc<SimilarityMatrix>>,
}

impl Snapshot {
    fn new(catalog: Catalog, source: String, popular_studio_count: usize) -> Self {
        let genres = features::list_genres(&catalog);
        let studios = features::list_studios(&catalog, popular_studio_count);
        Self {
            catalog: Arc::new(catalog),
            genres,
            studios,
            source,
            loaded_at: Utc::now(),
            similarity: OnceCell::new(),
        }
    }

    fn query(&self, filter: &MovieFilter) -> MovieQuery {
        MovieQuery::compile(filter, &self.studios.popular)
    }

    fn info(&self) -> CatalogInfo {
        CatalogInfo {
            source: self.source.clone(),
            movie_count: self.catalog.len(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Content-similarity recommendation and catalog query service.
///
/// Constructed explicitly and shared by reference. Every query runs against
/// the snapshot current when it started; `refresh` swaps in a new snapshot
/// and the similarity matrix of the old one is dropped with it.
pub struct RecommendationService {
    source: Arc<dyn CatalogSource>,
    popular_studio_count: usize,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl RecommendationService {
    /// Loads the initial catalog snapshot
    pub async fn build(
        source: Arc<dyn CatalogSource>,
        popular_studio_count: usize,
    ) -> AppResult<Self> {
        let snapshot = Self::load_snapshot(source.as_ref(), popular_studio_count).await?;
        Ok(Self {
            source,
            popular_studio_count,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    async fn load_snapshot(
        source: &dyn CatalogSource,
        popular_studio_count: usize,
    ) -> AppResult<Snapshot> {
        let description = source.describe();
        tracing::info!(source = %description, "Loading catalog");
        let catalog = source.load().await?;
        tracing::info!(source = %description, movie_count = catalog.len(), "Catalog loaded");
        Ok(Snapshot::new(catalog, description, popular_studio_count))
    }

    async fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Reloads the source. On failure the previous snapshot keeps serving.
    pub async fn refresh(&self) -> AppResult<CatalogInfo> {
        let snapshot = Self::load_snapshot(self.source.as_ref(), self.popular_studio_count).await?;
        let info = snapshot.info();
        *self.snapshot.write().await = Arc::new(snapshot);
        tracing::info!(movie_count = info.movie_count, "Catalog snapshot replaced");
        Ok(info)
    }

    pub async fn info(&self) -> CatalogInfo {
        self.current().await.info()
    }

    /// Similarity matrix of the current snapshot, building it on first use.
    ///
    /// Concurrent first callers wait for a single build.
    pub async fn similarity(&self) -> AppResult<Arc<SimilarityMatrix>> {
        let snapshot = self.current().await;
        Self::similarity_for(&snapshot).await
    }

    async fn similarity_for(snapshot: &Snapshot) -> AppResult<Arc<SimilarityMatrix>> {
        let matrix = snapshot
            .similarity
            .get_or_try_init(|| async {
                let catalog = snapshot.catalog.clone();
                tracing::info!(movie_count = catalog.len(), "Building similarity matrix");
                let matrix =
                    tokio::task::spawn_blocking(move || SimilarityMatrix::build(&catalog))
                        .await
                        .map_err(|e| {
                            AppError::Internal(format!("Similarity build task failed: {}", e))
                        })??;
                Ok::<_, AppError>(Arc::new(matrix))
            })
            .await?;
        Ok(matrix.clone())
    }

    pub async fn list_genres(&self) -> Vec<String> {
        self.current().await.genres.clone()
    }

    pub async fn list_studios(&self) -> StudioOptions {
        self.current().await.studios.clone()
    }

    /// Single movie by id
    pub async fn movie(&self, id: &MovieId) -> AppResult<MovieCard> {
        let snapshot = self.current().await;
        snapshot
            .catalog
            .get_by_id(id)
            .map(MovieCard::from)
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
    }

    /// Filtered catalog, ordered for display and windowed
    pub async fn browse(&self, filter: &MovieFilter, page: Page) -> MoviePage {
        let snapshot = self.current().await;
        let movies = query::browse(&snapshot.catalog, &snapshot.query(filter));
        MoviePage::from_ordered(&movies, page)
    }

    /// A fresh uniform random draw from the filtered catalog
    pub async fn discover(&self, filter: &MovieFilter, count: usize) -> Vec<MovieCard> {
        let snapshot = self.current().await;
        let query = snapshot.query(filter);
        let mut rng = rand::thread_rng();
        query::sample(&snapshot.catalog, &query, count, &mut rng)
            .into_iter()
            .map(MovieCard::from)
            .collect()
    }

    /// Movies most similar to the seed title.
    ///
    /// The `limit` most similar movies are taken first, then filtered; the
    /// survivors keep their similarity order.
    pub async fn recommend(
        &self,
        seed_title: &str,
        limit: usize,
        filter: &MovieFilter,
    ) -> AppResult<Recommendations> {
        let snapshot = self.current().await;
        let seed = snapshot
            .catalog
            .find_by_title(seed_title)
            .ok_or_else(|| UnknownTitleError(seed_title.trim().to_string()))?;

        let matrix = Self::similarity_for(&snapshot).await?;
        let ranked = matrix.similar_to(seed.index, limit);
        let movie_query = snapshot.query(filter);
        let kept = query::filter_ranked(&snapshot.catalog, &ranked, &movie_query);

        tracing::debug!(
            seed = %seed.id,
            candidates = ranked.len(),
            predicates = movie_query.predicates().len(),
            kept = kept.len(),
            "Recommendations ranked"
        );

        Ok(Recommendations {
            seed: MovieCard::from(seed),
            movies: kept
                .into_iter()
                .map(|(movie, score)| ScoredMovie {
                    movie: MovieCard::from(movie),
                    score,
                })
                .collect(),
        })
    }
}
