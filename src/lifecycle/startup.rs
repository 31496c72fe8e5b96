//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Build the dispatcher from configuration
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last so traffic only arrives once routes are compiled
//!   and the database is reachable

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::db::{Database, DbError};
use crate::functions::{build_table, AppEnv};
use crate::http::{fallback, Dispatcher, FallbackError, HttpServer, ServerOptions};
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::PatternError;
use crate::security::LegacyPolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("route table: {0}")]
    Routes(#[from] PatternError),

    #[error("fallback: {0}")]
    Fallback(#[from] FallbackError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Connect the database and assemble the dispatcher.
pub async fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher<AppEnv>, StartupError> {
    let db = Database::connect(&config.database).await?;
    if config.database.bootstrap_schema {
        db.bootstrap().await?;
    }

    let env = AppEnv {
        db,
        environment: config.environment.clone(),
        password_policy: if config.auth.allow_plaintext_passwords {
            LegacyPolicy::AllowPlaintext
        } else {
            LegacyPolicy::Reject
        },
    };

    let table = build_table(&config.routing)?;
    let fallback = Arc::from(fallback::from_config(&config.fallback)?);
    Ok(Dispatcher::new(table, Arc::new(env), fallback))
}

/// Start every subsystem and serve on `listener` until `shutdown` fires.
pub async fn serve(
    config: &AppConfig,
    listener: TcpListener,
    shutdown: Arc<Shutdown>,
) -> Result<(), StartupError> {
    let dispatcher = build_dispatcher(config).await?;
    let server = HttpServer::new(dispatcher, ServerOptions::from_config(config));
    server.run(listener, shutdown).await?;
    Ok(())
}

/// Full process startup: metrics, listener, signal handling, then serve.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(
        environment = %config.environment,
        bind_address = %config.listener.bind_address,
        database = %config.database.url,
        fallback = ?config.fallback.kind,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let raw = &config.observability.metrics_address;
        let addr: SocketAddr = raw.parse().map_err(|_| StartupError::MetricsAddress(raw.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(Arc::clone(&shutdown));

    serve(&config, listener, shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FallbackKind;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.fallback.kind = FallbackKind::NotFound;
        config
    }

    #[tokio::test]
    async fn test_build_dispatcher_from_config() {
        let mut config = memory_config();
        config.auth.allow_plaintext_passwords = true;
        let dispatcher = build_dispatcher(&config).await.unwrap();
        assert_eq!(dispatcher.env().password_policy, LegacyPolicy::AllowPlaintext);
        assert_eq!(dispatcher.env().environment, "development");
    }

    #[tokio::test]
    async fn test_network_fallback_requires_valid_upstream() {
        let mut config = memory_config();
        config.fallback.kind = FallbackKind::Network;
        config.fallback.upstream = Some("not a url".to_string());
        assert!(matches!(
            build_dispatcher(&config).await,
            Err(StartupError::Fallback(_))
        ));
    }
}
