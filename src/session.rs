//! Session struct definition
//!
//! Represents one connected peer: its identity, registered display name,
//! and the outbound text channel drained by the connection's write task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::SessionId;

/// Connected session information
///
/// The `sender` half feeds the connection's single write task, so every
/// outbound line for a session is serialized through one channel regardless
/// of which task produced it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Registered display name (unique among live sessions)
    pub name: String,
    /// Server → peer text channel
    pub sender: mpsc::Sender<String>,
}

impl Session {
    /// Create a new session with the given id, display name and sender channel
    pub fn new(id: SessionId, name: String, sender: mpsc::Sender<String>) -> Self {
        Self { id, name, sender }
    }

    /// Send a line of text to this session's peer
    ///
    /// Best-effort: returns an error if the outbound channel is closed
    /// (the peer disconnected), letting a broadcast fan-out stop early.
    pub async fn send(&self, text: String) -> Result<(), SendError> {
        self.sender
            .send(text)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}
