use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use services::services::{
    config::Config,
    quiz_engine::MemoryProgressStore,
    rate_limiter::RateLimiter,
    submission::SubmissionDispatcher,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Shared application state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub limiter: Arc<RateLimiter>,
    pub dispatcher: Arc<SubmissionDispatcher>,
    pub progress: Arc<MemoryProgressStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env());
    let limiter = Arc::new(RateLimiter::with_defaults());
    limiter.clone().spawn_sweeper(SWEEP_INTERVAL);

    let state = AppState {
        dispatcher: Arc::new(SubmissionDispatcher::from_config(&config)),
        progress: Arc::new(MemoryProgressStore::default()),
        limiter,
        config: config.clone(),
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
