// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sfs-remote: in-memory development backend for the sfs sync client.
//!
//! Applies submitted operations to an in-memory entity map and answers
//! fetches and pings over WebSocket. Nothing survives a restart.

mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// sfs-remote: development backend for offline sync
#[derive(Parser, Debug)]
#[command(name = "sfs-remote")]
#[command(about = "In-memory WebSocket backend for the sfs sync client")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting sfs-remote server");
    info!("  Bind address: {}", args.bind);

    let listener = TcpListener::bind(args.bind).await?;
    server::run(listener, state::ServerState::new()).await?;

    Ok(())
}
