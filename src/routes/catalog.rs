use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{CatalogInfo, StudioOptions},
    routes::AppState,
};

/// Handler listing every genre tag
pub async fn genres(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.service.list_genres().await)
}

/// Handler listing studio filter options
pub async fn studios(State(state): State<Arc<AppState>>) -> Json<StudioOptions> {
    Json(state.service.list_studios().await)
}

/// Handler describing the snapshot currently served
pub async fn info(State(state): State<Arc<AppState>>) -> Json<CatalogInfo> {
    Json(state.service.info().await)
}

/// Handler reloading the catalog source
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<CatalogInfo>> {
    tracing::info!(request_id = %request_id, "Processing catalog refresh");

    let info = state.service.refresh().await?;

    tracing::info!(
        request_id = %request_id,
        movie_count = info.movie_count,
        "Catalog refresh completed"
    );

    Ok(Json(info))
}
