//! Trip planner server binary.

use std::sync::Arc;

use secrecy::Secret;
use tracing_subscriber::EnvFilter;

use trip_planner::adapters::ai::{OpenAIConfig, OpenAIProvider};
use trip_planner::adapters::http::{build_router, HttpOptions, SessionHandlers};
use trip_planner::adapters::postgres::PostgresSessionRepository;
use trip_planner::adapters::storage::{FileSessionRepository, InMemorySessionRepository};
use trip_planner::adapters::websocket::{RoomManager, WebSocketState};
use trip_planner::application::{
    ConnectSessionHandler, CreateSessionHandler, HandleTurnHandler, SessionQueryHandler,
};
use trip_planner::config::{AppConfig, ServerConfig, StorageBackend};
use trip_planner::ports::{AIProvider, SessionRepository};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let repository = open_repository(&config).await;
    tracing::info!(backend = repository.backend_name(), "session store ready");

    let ai_provider: Arc<dyn AIProvider> = Arc::new(OpenAIProvider::new(openai_config(&config))?);
    let conversation = config.conversation.settings();

    let turns = HandleTurnHandler::new(
        repository.clone(),
        ai_provider,
        config.ai.model_settings(),
        &conversation,
    );
    let sessions = SessionHandlers::new(
        Arc::new(CreateSessionHandler::new(repository.clone())),
        Arc::new(SessionQueryHandler::new(repository.clone())),
        turns.clone(),
    );
    let websocket = WebSocketState::new(
        Arc::new(RoomManager::default()),
        Arc::new(ConnectSessionHandler::new(
            repository,
            conversation.welcome_message.clone(),
        )),
        turns,
    );

    let router = build_router(&HttpOptions::from(&config.server), sessions, websocket);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, model = %config.ai.model, "trip planner listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if server.is_production() {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}

fn openai_config(config: &AppConfig) -> OpenAIConfig {
    // validate() has already required the key
    let key = config
        .ai
        .openai_api_key
        .clone()
        .unwrap_or_else(|| Secret::new(String::new()));
    OpenAIConfig::from_secret(key)
        .with_model(config.ai.model.clone())
        .with_base_url(config.ai.base_url.clone())
        .with_timeout(config.ai.timeout())
        .with_max_retries(config.ai.max_retries)
}

/// Opens the configured store. A postgres connection failure falls back to
/// the in-memory store so the server still starts.
async fn open_repository(config: &AppConfig) -> Arc<dyn SessionRepository> {
    match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemorySessionRepository::new()),
        StorageBackend::File => Arc::new(FileSessionRepository::new(&config.storage.data_dir)),
        StorageBackend::Postgres => {
            match PostgresSessionRepository::connect(&config.database).await {
                Ok(repo) => Arc::new(repo),
                Err(e) => {
                    tracing::warn!(
                        url = %config.database.redacted_url(),
                        error = %e,
                        "postgres unavailable, falling back to in-memory sessions"
                    );
                    Arc::new(InMemorySessionRepository::new())
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
