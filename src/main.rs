use std::sync::Arc;
use std::time::Duration;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod events;
mod handlers;
mod models;
mod routes;
mod services;
mod store;

use auth::rate_limit::RateLimitState;
use config::{Config, StoreBackend};
use events::EventBus;
use services::inflight::InFlight;
use services::sentiment::{HttpSentimentClient, SentimentAnalyzer};
use store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub analyzer: Arc<dyn SentimentAnalyzer>,
    pub config: Arc<Config>,
    pub events: EventBus,
    pub rate_limiter: RateLimitState,
    pub inflight: InFlight,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodjournal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env());

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            let pool = db::create_pool(url).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let analyzer = HttpSentimentClient::new(
        config.sentiment_api_url.clone(),
        Duration::from_secs(config.sentiment_timeout_secs),
    )?;

    let rate_limiter = RateLimitState::new();
    rate_limiter.spawn_cleanup_worker();

    let state = AppState {
        store,
        analyzer: Arc::new(analyzer),
        config: config.clone(),
        events: EventBus::new(),
        rate_limiter,
        inflight: InFlight::new(),
    };

    let app = routes::router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
