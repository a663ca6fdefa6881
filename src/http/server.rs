//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router whose fallback dispatches into the controller
//! - Wire up tower layers (tracing); the request deadline lives in the controller
//! - Bind server to listener
//! - Swap reloaded configuration into the live snapshot
//! - Stop gracefully on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, LiveConfig};
use crate::sequence::{RequestContext, SequenceController};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SequenceController>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    live: LiveConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, controller: Arc<SequenceController>, live: LiveConfig) -> Self {
        let router = Self::build_router(AppState { controller });
        Self {
            router,
            config,
            live,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        let live = self.live.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    service_flag = %new_config.feature_flags.service_flag,
                    "Applying reloaded configuration"
                );
                live.store(new_config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Every request goes through the sequence controller.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    state
        .controller
        .handle(RequestContext::new(request, remote_addr))
        .await
}
