//! Archive REST Server
//!
//! HTTP API server bridging the archive search clients to the
//! upstream tabular data source.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use archive_server::server::startup::start_server;
use archive_server::server::types::AppState;

#[derive(Parser)]
#[command(name = "archive-server")]
#[command(about = "Archive API Server")]
#[command(version)]
struct Args {
  /// Server bind address
  #[arg(long, env = "ARCHIVE_BIND", default_value = "127.0.0.1:8787")]
  bind: SocketAddr,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("debug,hyper=info,reqwest=info")
  } else {
    EnvFilter::new("archive_server=info,tower_http=info,warn")
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting archive server");

  // Missing credentials do not stop startup; data routes answer with
  // a structured 500 until they are provided.
  let state = AppState::from_env();
  start_server(args.bind, state).await?;

  Ok(())
}
