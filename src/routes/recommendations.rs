use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::MovieCard,
    routes::{
        params::{FilterParams, PageParams},
        AppState,
    },
    services::recommendations::ScoredMovie,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Seed movie title, matched case-insensitively
    pub title: String,
    /// Most similar movies considered before filtering
    pub pool: Option<usize>,
}

impl RecommendationQuery {
    /// Candidate pool size, rejecting an explicit zero
    pub fn pool_or(&self, default_pool: usize) -> AppResult<usize> {
        match self.pool {
            Some(0) => Err(AppError::InvalidInput("pool must be positive".to_string())),
            Some(pool) => Ok(pool),
            None => Ok(default_pool),
        }
    }
}

/// One window of recommendations for a seed
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub seed: MovieCard,
    pub movies: Vec<ScoredMovie>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub next_offset: Option<usize>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
    Query(filters): Query<FilterParams>,
    Query(paging): Query<PageParams>,
) -> AppResult<Json<RecommendationPage>> {
    if params.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }
    let filter = filters.into_filter()?;
    let page = paging.into_page(state.settings.recommendation_page_size)?;
    let pool = params.pool_or(state.settings.recommendation_pool)?;

    tracing::info!(
        request_id = %request_id,
        seed = %params.title,
        pool,
        "Processing recommendation request"
    );

    let recommendations = state.service.recommend(&params.title, pool, &filter).await?;
    let total = recommendations.movies.len();

    tracing::info!(
        request_id = %request_id,
        seed = %recommendations.seed.id,
        total,
        "Recommendations completed"
    );

    Ok(Json(RecommendationPage {
        seed: recommendations.seed,
        movies: page.window(&recommendations.movies).to_vec(),
        total,
        offset: page.offset,
        limit: page.limit,
        next_offset: page.next_offset(total),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pool: Option<usize>) -> RecommendationQuery {
        RecommendationQuery {
            title: "Heat".to_string(),
            pool,
        }
    }

    #[test]
    fn test_pool_defaults_when_absent() {
        assert_eq!(query(None).pool_or(100).unwrap(), 100);
        assert_eq!(query(Some(5)).pool_or(100).unwrap(), 5);
    }

    #[test]
    fn test_zero_pool_is_invalid_input() {
        let err = query(Some(0)).pool_or(100).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
