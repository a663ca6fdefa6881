//! Request sequence gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum fallback ──▶ SequenceController
//!                                          │
//!                       ┌──────────────────┼──────────────────────┐
//!                       ▼                  ▼                      ▼
//!                 transport mw      generic mw             Router::find
//!                 (body, cors)      (request id,           ParamParser
//!                                    security headers)           │
//!                                                                ▼
//!                                                  AdmissionGate (authn → authz → flag)
//!                                                                │
//!                                                                ▼
//!                                                          Handler::call
//!                                                                │
//!     Client Response            ┌───────────────────────────────┤
//!     ◀────────────── ResponseSink::send            on failure: normalize → localize
//!                     ResponseSink::reject ◀────────────────────┘
//!
//!     Cross-cutting: config (+ hot reload), request log, metrics, lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sequence_gateway::config::watcher::ConfigWatcher;
use sequence_gateway::config::{
    apply_env_overrides, load_config, validate_config, ConfigError, GatewayConfig, LiveConfig,
};
use sequence_gateway::http::HttpServer;
use sequence_gateway::lifecycle::{assemble, spawn_signal_listener, Shutdown, StartupError};
use sequence_gateway::observability::{init_logging, metrics, TracingLogSink};
use sequence_gateway::toggles::FeatureToggleStore;

#[derive(Parser)]
#[command(name = "sequence-gateway")]
#[command(about = "Request sequence gateway serving the feature toggle API", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn default_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    init_logging(&config.observability).map_err(StartupError::from)?;
    tracing::info!("sequence-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        locale = %config.i18n.locale,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr).map_err(StartupError::from)?;
    }

    let live = LiveConfig::new(config.clone());
    let controller = assemble(
        &config,
        live.clone(),
        FeatureToggleStore::new(),
        Arc::new(TracingLogSink),
    )?;

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let watcher = watcher.with_current(config.clone());
            (Some(watcher.run().map_err(StartupError::from)?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, Arc::new(controller), live);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
