//! Customers admin service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, timeout, body limit)
//!                          │
//!                          ▼
//!                     http::driver ──▶ routing::RouteTable (middleware, then terminal)
//!                          │                  │
//!                          │                  ▼
//!                          │             functions::* ──▶ db (SQLite)
//!                          ▼
//!                     http::fallback (static assets | upstream | 404)
//!
//!     Cross-cutting: config, observability (tracing + prometheus),
//!                    lifecycle (startup, signals, shutdown drain), security
//! ```

use std::path::PathBuf;

use clap::Parser;

use customers_admin::config::load_or_default;
use customers_admin::lifecycle::startup;
use customers_admin::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "customers-admin")]
#[command(about = "Customers admin API server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "customers-admin starting");

    startup::run(config).await?;
    Ok(())
}
