use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use xmlrpc_warden::audit::{AuditSink, FileAuditLog};
use xmlrpc_warden::config::WardenConfig;
use xmlrpc_warden::gate::AccessGate;
use xmlrpc_warden::http::{AppState, HttpServer};
use xmlrpc_warden::ratelimit::{CounterStore, FileCounterStore, RateLimiter};

#[derive(Parser, Debug)]
#[command(name = "xmlrpc-warden")]
#[command(about = "Admission-control gateway for XML-RPC endpoints")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting XML-RPC Warden Gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = WardenConfig::load_or_default(args.config.as_deref());
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    info!(
        bind_addr = %config.server.bind_addr,
        upstream = %config.server.upstream_url,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&config.server.data_dir)?;

    let store: Arc<dyn CounterStore> =
        Arc::new(FileCounterStore::new(config.server.data_dir.join("counters.json")));
    let audit: Arc<dyn AuditSink> =
        Arc::new(FileAuditLog::new(config.server.data_dir.join("xmlrpc_log.txt")));
    let gate = AccessGate::new(RateLimiter::new(Arc::clone(&store)), audit);
    info!("Access gate initialized");

    let bind_addr = config.server.bind_addr;
    let state = Arc::new(AppState {
        gate,
        config,
        client: reqwest::Client::new(),
        store,
    });

    let server = HttpServer::new(bind_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("XML-RPC Warden Gateway stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
