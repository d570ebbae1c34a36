//! udpkv Server Binary
//!
//! Starts the UDP server for udpkv.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use udpkv::network::ServeExit;
use udpkv::{Config, Server};

/// udpkv Server
#[derive(Parser, Debug)]
#[command(name = "udpkv-server")]
#[command(about = "Key-value store over UDP with at-most-once semantics")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:4445")]
    listen: String,

    /// Worker threads sharing the socket
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Dedup cache capacity (message IDs)
    #[arg(long, default_value = "100")]
    dedup_entries: usize,

    /// Dedup inactivity TTL in milliseconds
    #[arg(long, default_value = "5000")]
    dedup_ttl_ms: u64,

    /// Maximum key length in bytes
    #[arg(long, default_value = "32")]
    max_key_len: usize,

    /// Maximum value length in bytes
    #[arg(long, default_value = "10000")]
    max_value_len: usize,

    /// Process memory budget in MB (defaults to total system memory)
    #[arg(short = 'm', long)]
    memory_mb: Option<u64>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,udpkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("udpkv Server v{}", udpkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let memory_limit = args.memory_mb.map(|mb| mb * 1024 * 1024);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .workers(args.workers)
        .dedup_max_entries(args.dedup_entries)
        .dedup_ttl_ms(args.dedup_ttl_ms)
        .max_key_len(args.max_key_len)
        .max_value_len(args.max_value_len)
        .memory_limit(memory_limit)
        .build();

    let server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    match server.run() {
        Ok(ServeExit::Shutdown) => {
            tracing::info!("Shutdown requested by client; exiting");
            std::process::exit(0);
        }
        Ok(ServeExit::Stopped) => tracing::info!("Server stopped"),
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    }
}
