//! kb-gateway binary entry point.
//!
//! Startup order: parse CLI → load and validate configuration (fatal on any
//! error, before a single request is served) → init logging → bind → serve.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use kb_gateway::config::{default_config, load_config};
use kb_gateway::http::HttpServer;
use kb_gateway::observability;

#[derive(Parser)]
#[command(name = "kb-gateway")]
#[command(about = "Forwarding proxy for AI knowledge-base backends", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Without one, the built-in `/api/kb`
    /// namespace is served (base URL overridable via $KB_URL).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    observability::logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        namespaces = config.upstreams.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // The sender must outlive the server; dropping it would read as an
    // immediate shutdown signal.
    let (_shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    let server = HttpServer::new(config);
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
