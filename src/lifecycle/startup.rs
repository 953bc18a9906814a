//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize all subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: config, storage and bind errors are fatal
//! - Metrics are optional; an exporter failure is logged and ignored
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{load_config, ConfigError, MonitorConfig};
use crate::config::validation::validate_config;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::monitor::ProxyPipeline;
use crate::observability::{logging, metrics};
use crate::storage::{seed, MonitorStore, SqliteStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Read the config file when one is given, otherwise validate the defaults.
pub fn load(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = MonitorConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// A fully initialized monitor, bound and ready to serve.
pub struct Application {
    server: HttpServer,
    listener: TcpListener,
    store: SqliteStore,
}

impl Application {
    /// Connect storage, seed if asked, build the pipeline and bind the listener.
    pub async fn build(config: MonitorConfig) -> Result<Self, StartupError> {
        let store = SqliteStore::connect(&config.database).await?;

        if config.database.seed_demo_data {
            let seeded = seed::seed_demo_data(&store).await?;
            tracing::info!(rows = seeded, "Demo data seeded");
        }

        let shared: Arc<dyn MonitorStore> = Arc::new(store.clone());
        let pipeline =
            ProxyPipeline::from_config(&config, shared.clone()).map_err(StartupError::Upstream)?;

        let address = config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;

        let server = HttpServer::new(config, pipeline, shared);
        Ok(Self {
            server,
            listener,
            store,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires, then close the database pool.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        let result = self.server.run(self.listener, shutdown).await;
        self.store.close().await;
        result.map_err(StartupError::Serve)
    }
}

/// Boot the whole service and block until it has shut down.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = load(config_path)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-monitor starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        database = %config.database.url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Application::build(config).await?;
    let local_addr = app.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    app.run(receiver).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
