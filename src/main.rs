//! Media gateway.
//!
//! Serves the JSON API for the video front-end and relays media byte
//! ranges from upstream CDNs.
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                  MEDIA GATEWAY                │
//!   Browser       │  ┌──────────┐   ┌──────────┐   ┌──────────┐   │
//!   ──────────────┼─▶│  http    │──▶│   api    │──▶│providers │───┼──▶ youtubei / yt-dlp
//!                 │  │ server   │   └──────────┘   └──────────┘   │
//!                 │  │          │   ┌──────────┐   ┌──────────┐   │
//!                 │  │          │──▶│  proxy   │──▶│  relay   │◀──┼─── media CDN
//!                 │  └──────────┘   └──────────┘   └──────────┘   │
//!                 │   config · observability · lifecycle          │
//!                 └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use media_gateway::config::loader;
use media_gateway::http::HttpServer;
use media_gateway::lifecycle::Shutdown;
use media_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "media-gateway", version, about = "Range-aware media proxy and video API")]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = loader::load(args.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("media-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        channel_capacity = config.proxy.channel_capacity,
        idle_read_timeout_secs = config.proxy.idle_read_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { shutdown.trigger_on_ctrl_c().await }
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
