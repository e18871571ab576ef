mod admin;
mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod models;
mod recommendations;
mod routes;
mod scoring_client;
mod state;
mod storage;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::recommendations::{
    HexIdValidator, PgCandidateStore, PgJobStore, RecommendationService,
};
use crate::routes::build_router;
use crate::scoring_client::HttpScoringClient;
use crate::state::AppState;
use crate::storage::S3FileStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and run migrations
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let storage = Arc::new(S3FileStorage::from_config(&config).await);
    info!("S3 storage initialized (bucket: {})", config.s3_bucket);

    // Initialize scoring service client
    let scoring = HttpScoringClient::new(
        config.scoring_service_url.clone(),
        Duration::from_secs(config.scoring_timeout_secs),
    )
    .context("Failed to build scoring service client")?;
    info!("Scoring service client initialized ({})", config.scoring_service_url);

    let recommender = RecommendationService::new(
        Arc::new(PgCandidateStore::new(db.clone())),
        Arc::new(PgJobStore::new(db.clone())),
        Arc::new(scoring),
        Arc::new(HexIdValidator::new(config.job_id_hex_length)),
    );

    // Build app state
    let state = AppState {
        db,
        storage,
        recommender: Arc::new(recommender),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
