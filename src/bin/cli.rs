//! udpkv CLI Client
//!
//! Command-line interface for interacting with udpkv.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use udpkv::protocol::Response;
use udpkv::{ClientConfig, KvClient};

/// udpkv CLI
#[derive(Parser, Debug)]
#[command(name = "udpkv-cli")]
#[command(about = "CLI for the udpkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:4445")]
    server: String,

    /// Retransmissions after the first send
    #[arg(long, default_value = "3")]
    retries: u32,

    /// Initial reply timeout in milliseconds
    #[arg(long, default_value = "100")]
    timeout_ms: u64,

    /// Ceiling for the doubled timeout in milliseconds
    #[arg(long, default_value = "5000")]
    max_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value
    Put {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        version: i32,
    },

    /// Fetch a value
    Get { key: String },

    /// Delete a key
    Remove { key: String },

    /// Delete every key
    Wipeout,

    /// Check that the server is alive
    Ping,

    /// Print the server's process ID
    Pid,

    /// Print the membership count
    Members,

    /// Stop the server
    Shutdown,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .max_retries(args.retries)
        .initial_timeout_ms(args.timeout_ms)
        .max_timeout_ms(args.max_timeout_ms)
        .build();

    let client = match KvClient::connect(args.server.as_str(), config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Put {
            key,
            value,
            version,
        } => client.put(key.as_bytes(), value.as_bytes(), version),
        Commands::Get { key } => client.get(key.as_bytes()),
        Commands::Remove { key } => client.remove(key.as_bytes()),
        Commands::Wipeout => client.wipeout(),
        Commands::Ping => client.is_alive(),
        Commands::Pid => client.get_pid(),
        Commands::Members => client.get_membership_count(),
        Commands::Shutdown => match client.shutdown() {
            Ok(()) => {
                println!("shutdown sent");
                return;
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_response(response: &Response) {
    println!("{}", response.err_code);
    if let Some(value) = &response.value {
        println!("value: {}", String::from_utf8_lossy(value));
    }
    if let Some(version) = response.version {
        println!("version: {}", version);
    }
    if let Some(pid) = response.pid {
        println!("pid: {}", pid);
    }
    if let Some(count) = response.membership_count {
        println!("members: {}", count);
    }
}
