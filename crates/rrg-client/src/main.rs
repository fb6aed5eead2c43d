//! RRG handshake client - Entry Point
//!
//! Sends one RRG request document over the configured WebSocket and
//! prints the returned result JSON on stdout.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// RRG WebSocket handshake client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RRG_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Give up after this many milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print an empty line instead of failing when no result arrives
    #[arg(long)]
    legacy: bool,

    /// RRG request document to send, or `-` for stdin
    payload: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    rrg_telemetry::init_logging()?;

    info!("Starting RRG client v{}", env!("CARGO_PKG_VERSION"));

    let mut config = rrg_client::AppConfig::load(args.config.as_deref())?;
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }
    info!(?config, "Configuration loaded");

    // Fail on bad config before reading input or connecting
    let client = config.client()?;
    let payload = rrg_client::read_payload(&args.payload)?;

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            ctrl_c_token.cancel();
        }
    });

    let result = rrg_client::send_request(&client, payload, shutdown, args.legacy).await?;
    println!("{result}");
    Ok(())
}
