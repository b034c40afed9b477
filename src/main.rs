//! Multi-client chat server - Entry Point
//!
//! Parses startup configuration, loads the bad-word filter, starts the
//! ChatServer actor and accepts connections.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{handle_connection, ChatServer, WordFilter};

/// Default listen port
const DEFAULT_PORT: u16 = 1500;

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Usage: chat_relay [port] [badwords-file]
    // A bad-word file argument enables filtering. Bad arguments and an
    // unreadable file are fatal startup errors.
    let args: Vec<String> = env::args().collect();
    let port: u16 = match args.get(1) {
        Some(port) => port.parse()?,
        None => DEFAULT_PORT,
    };
    let filter = match args.get(2) {
        Some(path) => Some(WordFilter::from_file(path)?),
        None => None,
    };
    if let Some(filter) = &filter {
        info!("Filtering enabled with {} forbidden terms", filter.len());
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server waiting for clients on port {}", port);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx, filter).run());

    // Connection accept loop. Handlers are spawned immediately, so a slow
    // peer's registration read never blocks acceptance.
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
