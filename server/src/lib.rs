//! REST backend for a social events application.
//!
//! Events are created by authenticated users, listed publicly, and joined at
//! most once per user. See [`repository::EventRepository`] for the domain
//! rules and [`routes::create_routes`] for the HTTP surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use auth::{DevIdentityVerifier, IdentityVerifier, TokenTableVerifier};
use config::{AuthConfig, Config, ConfigError, StorageBackend};
use db::Database;
use repository::EventRepository;
use routes::create_routes;
use state::AppState;
use store::{EventStore, InMemoryEventStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to read token file {path:?}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid token file {path:?}: {source}")]
    TokenTable {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connects the store, serves until a shutdown signal arrives, then releases
/// the database connections.
pub async fn run(config: Config) -> Result<(), StartupError> {
    let database = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let database = Database::connect(url, config.database_max_connections).await?;
            database.migrate().await?;
            Some(database)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, events are lost on restart");
            None
        }
    };

    let store: Arc<dyn EventStore> = match &database {
        Some(database) => Arc::new(database.events()),
        None => Arc::new(InMemoryEventStore::new()),
    };
    let verifier = build_verifier(&config.auth).await?;

    info!(
        storage = %config.storage,
        require_future_event_date = config.event_policy.require_future_event_date,
        "Event repository ready"
    );
    let state = AppState::new(EventRepository::new(store, config.event_policy), verifier);
    let app = create_routes(state, &config.cors_allowed_origins, config.production);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("🚀 Server running at http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Server shutting down...");
    if let Some(database) = &database {
        database.close().await;
    }

    served?;
    Ok(())
}

async fn build_verifier(auth: &AuthConfig) -> Result<Arc<dyn IdentityVerifier>, StartupError> {
    match auth {
        AuthConfig::Development(identity) => {
            warn!(
                email = %identity.email,
                "Development authentication enabled, every bearer token is accepted"
            );
            Ok(Arc::new(DevIdentityVerifier::new(identity.clone())))
        }
        AuthConfig::Tokens(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| StartupError::TokenFile {
                    path: path.clone(),
                    source,
                })?;
            let verifier =
                TokenTableVerifier::from_json(&json).map_err(|source| StartupError::TokenTable {
                    path: path.clone(),
                    source,
                })?;

            info!(tokens = verifier.len(), "Token table authentication enabled");
            Ok(Arc::new(verifier))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
