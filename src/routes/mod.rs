use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::RecommendationService,
};

pub mod catalog;
pub mod movies;
pub mod params;
pub mod recommendations;

/// Shared state handed to every handler
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub settings: QuerySettings,
}

/// Request defaults taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct QuerySettings {
    pub browse_page_size: usize,
    pub recommendation_page_size: usize,
    pub recommendation_pool: usize,
    pub discover_count: usize,
}

impl From<&Config> for QuerySettings {
    fn from(config: &Config) -> Self {
        Self {
            browse_page_size: config.browse_page_size,
            recommendation_page_size: config.recommendation_page_size,
            recommendation_pool: config.recommendation_pool,
            discover_count: config.discover_count,
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // Outermost first: the request ID must exist before the trace span is made
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(catalog::genres))
        .route("/studios", get(catalog::studios))
        .route("/catalog", get(catalog::info))
        .route("/catalog/refresh", post(catalog::refresh))
        .route("/movies", get(movies::browse))
        .route("/movies/random", get(movies::discover))
        .route("/movies/:id", get(movies::movie))
        .route("/recommendations", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
