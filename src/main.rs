//! HTTP traffic capture and inspection service.
//!
//! Any inbound request that does not hit the management API is persisted
//! verbatim and made browsable through a paginated listing/detail API.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                 HTTP CAPTURE                      │
//!                    │                                                   │
//!   Client Request   │  ┌─────────┐   ┌───────────┐   ┌──────────────┐  │
//!   ─────────────────┼─▶│  http   │──▶│ capture   │──▶│  dispatcher  │  │
//!                    │  │ server  │   │ normalize │   │  (app)       │  │
//!                    │  └─────────┘   └───────────┘   └──────┬───────┘  │
//!                    │                                       │          │
//!                    │            ┌──────────────────────────┼───────┐  │
//!                    │            ▼                          ▼       │  │
//!                    │     ┌──────────────┐          ┌──────────────┐│  │
//!                    │     │  management  │          │   capture    ││  │
//!                    │     │  API routes  │          │   pipeline   ││  │
//!                    │     └──────┬───────┘          └──────┬───────┘│  │
//!                    │            └──────────┬──────────────┘        │  │
//!                    │                       ▼                       │  │
//!                    │               ┌──────────────┐                │  │
//!                    │               │   storage    │ (SQLite)       │  │
//!                    │               └──────────────┘                │  │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use httpcapture::config::{load_config, CaptureConfig};
use httpcapture::storage::{Database, RequestRepository};
use httpcapture::{App, HttpServer};

#[derive(Parser)]
#[command(name = "httpcapture")]
#[command(about = "HTTP traffic capture and inspection service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    listen: Option<String>,

    /// Override the SQLite database path.
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    httpcapture::observability::logging::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CaptureConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.storage.database_path,
        capture_payload = config.capture.capture_payload,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            httpcapture::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let database = Database::open(PathBuf::from(&config.storage.database_path))?;
    let repository = Arc::new(RequestRepository::new(database));
    let app = Arc::new(App::new(repository, &config.capture));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = HttpServer::new(config, app);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
