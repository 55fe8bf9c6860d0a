//! SP-API relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                      RELAY                           │
//!   POST /           │  ┌─────────┐   ┌─────────────┐   ┌───────────────┐   │
//!   ─────────────────┼─▶│  http   │──▶│  routing    │──▶│  operations   │   │
//!                    │  │ server  │   │ router +    │   │  handlers     │   │
//!                    │  └─────────┘   │ registry    │   └───────┬───────┘   │
//!                    │                └──────┬──────┘           │           │
//!                    │                       │                  ▼           │
//!                    │                ┌──────▼──────┐   ┌───────────────┐   │    SP-API
//!                    │                │ auth (LWA)  │   │ spapi client  │───┼──▶ regional
//!                    │                └─────────────┘   │ + retry       │   │    endpoint
//!                    │                                  └───────────────┘   │
//!                    │  config · observability · lifecycle · security       │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use sp_api_relay::config::loader::{finalize, load_config};
use sp_api_relay::config::RelayConfig;
use sp_api_relay::lifecycle::startup::bind_listener;
use sp_api_relay::observability::{logging, metrics};
use sp_api_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "relay", version, about = "SP-API relay for the spreadsheet content manager")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => finalize(RelayConfig::default())?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sp-api-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = ?config.runtime.environment,
        max_attempts = config.retries.max_attempts,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Registry and clients first; the listener only binds once they are ready.
    let server = HttpServer::new(config.clone())?;
    let listener = bind_listener(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = shutdown.trigger_on_signal() => {}
    }
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
