//! Real-time voting room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin stmsh-server
//! cargo run --bin stmsh-server -- --host 0.0.0.0 --port 3000
//! ```

use std::time::Duration;

use clap::Parser;
use stmsh_server::{config::ServerConfig, ui::Server};
use stmsh_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "stmsh-server")]
#[command(about = "Real-time voting room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds between pings sent to each client
    #[arg(long, default_value = "54")]
    ping_interval_secs: u64,

    /// Seconds to wait for any frame from a client before dropping it
    #[arg(long, default_value = "60")]
    pong_wait_secs: u64,

    /// Seconds allowed to write one frame to a client
    #[arg(long, default_value = "10")]
    write_wait_secs: u64,

    /// Largest inbound message in bytes
    #[arg(long, default_value = "2048")]
    max_message_size: usize,

    /// Outbound events buffered per client
    #[arg(long, default_value = "64")]
    outbox_capacity: usize,

    /// Seconds between sweeps for empty rooms
    #[arg(long, default_value = "300")]
    cleanup_interval_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            ping_interval: Duration::from_secs(args.ping_interval_secs),
            pong_wait: Duration::from_secs(args.pong_wait_secs),
            write_wait: Duration::from_secs(args.write_wait_secs),
            max_message_size: args.max_message_size,
            outbox_capacity: args.outbox_capacity,
            cleanup_interval: Duration::from_secs(args.cleanup_interval_secs),
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_PKG_NAME"), "stmsh-shared", "tower-http"], "debug");

    let args = Args::parse();
    let host = args.host.clone();
    let port = args.port;

    let server = Server::new(ServerConfig::from(args).normalized());
    if let Err(e) = server.run(host, port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
