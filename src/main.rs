//! Edge Router
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                   EDGE ROUTER                     │
//!                          │                                                   │
//!     Client Request       │  ┌────────┐   ┌───────────┐   ┌──────────────┐   │
//!     ─────────────────────┼─▶│  http  │──▶│ prefilter │──▶│  classifier  │   │
//!                          │  │ server │   │ 403/robots│   │mobile/desktop│   │
//!                          │  └────────┘   │ /redirect │   └──────┬───────┘   │
//!                          │               └───────────┘          ▼           │
//!                          │                              ┌──────────────┐    │      ┌─────────────┐
//!                          │                              │   resolver   │────┼─────▶│ /api/data   │
//!                          │                              │static/dynamic│    │      │ config svc  │
//!                          │                              └──────┬───────┘    │      └─────────────┘
//!                          │                                     ▼            │
//!     Client Response      │                              ┌──────────────┐    │
//!     ◀────────────────────┼──────────────────────────────│  forwarder   │────┼────▶ Origin
//!                          │                              │rewrite / pass│    │   (rewritten or
//!                          │                              └──────────────┘    │    original)
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_router::config::validation::validate_config;
use edge_router::config::{load_config, ConfigError, EdgeConfig};
use edge_router::lifecycle::{signals, startup, Shutdown};
use edge_router::observability::logging;

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Device-aware edge router", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the pass-through origin (e.g. http://127.0.0.1:3000).
    #[arg(short, long)]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(origin) = cli.origin {
        config.forwarder.origin = Some(origin);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "edge-router starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    startup::start(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
