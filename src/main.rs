use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinema_api::{
    config::Config,
    routes::{create_router, AppState, QuerySettings},
    services::{CsvCatalogSource, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinema_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(catalog = %config.catalog_path, "Starting cinema-api");

    let source = Arc::new(CsvCatalogSource::new(&config.catalog_path));
    let service =
        Arc::new(RecommendationService::build(source, config.popular_studio_count).await?);

    if config.warm_similarity {
        let matrix = service.similarity().await?;
        tracing::info!(
            movies = matrix.size(),
            vocabulary = matrix.vocabulary_size(),
            "Similarity matrix ready"
        );
    }

    let state = Arc::new(AppState {
        service,
        settings: QuerySettings::from(&config),
    });
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
