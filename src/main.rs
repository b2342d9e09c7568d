//! Endpoint gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ router (mount route + endpoint routes)
//!                                         │
//!                                         ▼
//!                                  forwarding pipeline ──▶ hooks
//!                                         │
//!                                         ▼
//!     Client Response              upstream transport ──────────────▶ Upstream API
//!     ◀────────────── streamed or hook-handled response ◀───────────
//! ```

use std::path::PathBuf;

use clap::Parser;

use endpoint_gateway::lifecycle::{start, wait_for_signal, Shutdown, Started};

#[derive(Parser)]
#[command(name = "endpoint-gateway")]
#[command(about = "Forward a mounted set of API endpoints upstream", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let Started { server, listener, .. } = start(&args.config).await?;
    tracing::info!("endpoint-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
