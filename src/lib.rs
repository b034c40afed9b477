//! Multi-Client Chat Server Library
//!
//! A broadcast chat server built with tokio-tungstenite using the Actor
//! pattern for state management. Peers register a display name on connect
//! and exchange broadcast or direct messages relayed through the server.
//!
//! # Features
//! - WebSocket connection handling
//! - Display-name registration with collision disambiguation
//! - Broadcast messages with `HH:MM:SS` timestamps
//! - Direct messages (`/msg`) with sender echo
//! - Listing other connected users (`/list`)
//! - Optional bad-word filtering of delivered text
//! - Clean logout and abrupt-disconnect handling
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the session registry and
//!   performing all routing
//! - Each connection has a handler task communicating with the server
//! - Each session has a single write task draining its outbound channel
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{ChatServer, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:1500").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx, None).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod error;
pub mod filter;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use error::{AppError, SendError};
pub use filter::WordFilter;
pub use handler::handle_connection;
pub use message::{parse_direct, Envelope};
pub use registry::Registry;
pub use server::{ChatServer, DisconnectReason, ServerCommand};
pub use session::Session;
pub use types::SessionId;
