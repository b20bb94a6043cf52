use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{MovieCard, MovieId, MoviePage},
    routes::{
        params::{FilterParams, PageParams},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    count: Option<usize>,
}

/// Handler for catalog browsing
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(filters): Query<FilterParams>,
    Query(paging): Query<PageParams>,
) -> AppResult<Json<MoviePage>> {
    let filter = filters.into_filter()?;
    let page = paging.into_page(state.settings.browse_page_size)?;

    let result = state.service.browse(&filter, page).await;

    tracing::info!(
        request_id = %request_id,
        filtered = !filter.is_empty(),
        total = result.total,
        offset = page.offset,
        returned = result.movies.len(),
        "Browse completed"
    );

    Ok(Json(result))
}

/// Handler for random discovery
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(filters): Query<FilterParams>,
    Query(params): Query<DiscoverQuery>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let filter = filters.into_filter()?;
    let count = params.count.unwrap_or(state.settings.discover_count);

    let movies = state.service.discover(&filter, count).await;

    tracing::info!(
        request_id = %request_id,
        requested = count,
        returned = movies.len(),
        "Discovery completed"
    );

    Ok(Json(movies))
}

/// Handler for a single movie's details
pub async fn movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieCard>> {
    let movie = state.service.movie(&MovieId(id)).await?;
    Ok(Json(movie))
}
