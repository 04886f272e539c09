//! HTTP server wiring and lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::config::WardenConfig;
use crate::error::Result;
use crate::gate::AccessGate;
use crate::ratelimit::CounterStore;

use super::handlers;

/// Shared application state.
pub struct AppState {
    /// Admission-control gate
    pub gate: AccessGate,
    /// Effective configuration
    pub config: WardenConfig,
    /// Client used to forward permitted requests upstream
    pub client: reqwest::Client,
    /// Counter store, read by the status panel
    pub store: Arc<dyn CounterStore>,
}

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/xmlrpc", post(handlers::xmlrpc))
        .route("/status", get(handlers::status))
        .route("/token/generate", get(handlers::generate_token))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// HTTP server for the gateway.
pub struct HttpServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new server bound to the given address.
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self { addr, state }
    }

    /// Start the server with graceful shutdown.
    ///
    /// The server stops when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Starting HTTP gateway");

        axum::serve(
            listener,
            router(self.state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await?;

        Ok(())
    }
}
