mod config;
mod directory;
mod game;
mod models;
mod routes;
mod session;
mod store;
mod websocket;
mod words;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use config::Config;
use directory::GameDirectory;
use game::GameEngine;
use store::{GameStore, LayeredStore, MemoryStore, PgStore};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websocket::Rooms;
use words::WordBank;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub engine: GameEngine,
    pub games: GameDirectory,
    /// Live connections per game, for broadcasts
    pub rooms: Rooms,
}

impl AppState {
    pub fn new(config: Config, engine: GameEngine, store: Arc<dyn GameStore>) -> Self {
        Self {
            config,
            engine,
            games: GameDirectory::new(store),
            rooms: Rooms::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "party_bingo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting party bingo server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // A bank that cannot fill a card is fatal
    let words = match &config.game.word_bank_path {
        Some(path) => WordBank::load(path)
            .await
            .with_context(|| format!("Failed to load word bank from {}", path))?,
        None => WordBank::builtin(),
    };
    let engine = GameEngine::new(Arc::new(words))?;
    tracing::info!("Word bank ready with {} words", engine.word_bank().len());

    let store = build_store(&config).await;
    tracing::info!(
        "Game store ready ({})",
        if store.has_durable() { "memory + database" } else { "memory only" }
    );

    let state = Arc::new(AppState::new(config.clone(), engine, Arc::new(store)));

    let app = build_router(state, &config.server.frontend_dir);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Memory store, backed by PostgreSQL when one is configured and reachable
async fn build_store(config: &Config) -> LayeredStore {
    let Some(url) = &config.database.url else {
        tracing::warn!("DATABASE_URL not set; games are kept in memory only");
        return LayeredStore::memory_only();
    };

    match PgStore::connect(url, config.database.max_connections).await {
        Ok(pg) => {
            tracing::info!("Connected to database");
            LayeredStore::new(MemoryStore::new(), Some(Arc::new(pg) as Arc<dyn GameStore>))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to database: {}. Games are kept in memory only.",
                e
            );
            LayeredStore::memory_only()
        }
    }
}

fn build_router(state: Arc<AppState>, frontend_dir: &str) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Pages, scripts and QR rendering live in the frontend
    let frontend_service = ServeDir::new(frontend_dir);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(websocket::handle_websocket))
        // API routes
        .merge(routes::create_routes())
        .fallback_service(frontend_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    let engine = GameEngine::new(Arc::new(WordBank::builtin())).expect("builtin bank");
    Arc::new(AppState::new(
        config::test_config(),
        engine,
        Arc::new(MemoryStore::new()),
    ))
}
