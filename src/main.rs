//! Scan Gate
//!
//! Admission controller in front of an expensive scan service: a POST to the
//! gated route is admitted only while the caller is within its quota over a
//! trailing window; everything else is forwarded untouched.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      SCAN GATE                       │
//!                 │                                                      │
//!   Client ───────┼─▶ trace ─▶ request id ─▶ cors ─▶ timeout ─▶ admission │
//!                 │                                              │       │
//!                 │                      ┌───────────────────────┤       │
//!                 │                      ▼                       ▼       │
//!                 │              /api/ratelimit,          upstream fwd ──┼──▶ Scan service
//!                 │              /api/health, admin                      │
//!                 │                      │                       │       │
//!                 │                      └──────────┬────────────┘       │
//!                 │                                 ▼                    │
//!                 │              limiter (window store) ◀── sweeper      │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use scan_gate::config;
use scan_gate::http::HttpServer;
use scan_gate::lifecycle::{signals, Shutdown};
use scan_gate::observability;

#[derive(Parser, Debug)]
#[command(name = "scan-gate")]
#[command(about = "Sliding-window admission control in front of a scan service")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    observability::logging::init(&config.observability);

    tracing::info!("scan-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        max_requests = config.rate_limit.max_requests,
        window_minutes = config.rate_limit.window_minutes,
        allowed_origins = ?config.cors.allowed_origins,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
