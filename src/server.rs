//! ChatServer Actor implementation
//!
//! The central actor that owns the session registry and performs all message
//! routing. Uses the Actor pattern with mpsc channels: per-connection handler
//! tasks send commands here, and this single task is the mutual-exclusion
//! discipline around every registry mutation and delivery-time traversal.
//!
//! Broadcast and direct deliveries are handed off to short-lived spawned
//! tasks so a slow recipient never stalls command processing; a fan-out stops
//! at the first failed write (inherited best-effort behavior, see DESIGN.md).

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::filter::WordFilter;
use crate::registry::Registry;
use crate::session::Session;
use crate::types::SessionId;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer sent a logout envelope
    Logout,
    /// The connection ended without a logout (EOF, reset, transport error)
    Dropped,
}

/// Commands sent from connection handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// A peer completed its registration read
    Register {
        id: SessionId,
        name: String,
        sender: mpsc::Sender<String>,
    },
    /// A session ended; deregister it
    Deregister {
        id: SessionId,
        reason: DisconnectReason,
    },
    /// Broadcast a chat line to every live session
    Broadcast { from: SessionId, text: String },
    /// Send the requester the names of all other live sessions
    List { from: SessionId },
    /// Deliver a direct message to one named session
    Direct {
        from: SessionId,
        target: String,
        body: String,
    },
}

/// The main ChatServer actor
///
/// Owns the registry and the bad-word filter, and processes commands from
/// connection handlers one at a time.
pub struct ChatServer {
    /// Live sessions, in registration order
    registry: Registry,
    /// Bad-word filter; `None` when filtering is disabled
    filter: Option<WordFilter>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver and filter
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, filter: Option<WordFilter>) -> Self {
        Self {
            registry: Registry::new(),
            filter,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register { id, name, sender } => {
                self.handle_register(id, name, sender);
            }
            ServerCommand::Deregister { id, reason } => {
                self.handle_deregister(id, reason);
            }
            ServerCommand::Broadcast { from, text } => {
                self.handle_broadcast(from, text);
            }
            ServerCommand::List { from } => {
                self.handle_list(from).await;
            }
            ServerCommand::Direct { from, target, body } => {
                self.handle_direct(from, target, body).await;
            }
        }
    }

    /// Handle a new registration
    ///
    /// A display name that collides with a live session's name gets the
    /// session's id appended before insertion.
    fn handle_register(&mut self, id: SessionId, name: String, sender: mpsc::Sender<String>) {
        let session = Session::new(id, name, sender);
        let name = self.registry.add(session);
        info!("{} has joined the server", name);
    }

    /// Handle a session ending
    ///
    /// Removal is idempotent; a second deregister for the same id is a no-op.
    fn handle_deregister(&mut self, id: SessionId, reason: DisconnectReason) {
        let Some(session) = self.registry.remove(id) else {
            return;
        };
        match reason {
            DisconnectReason::Logout => {
                info!("{} has logged out successfully", session.name);
            }
            DisconnectReason::Dropped => {
                warn!("{} terminated the program inappropriately", session.name);
            }
        }
    }

    /// Handle a broadcast
    ///
    /// Formats `"<name>: <text>"`, filters, prepends the timestamp, logs the
    /// final line, then fans out to a snapshot of the registry on a spawned
    /// task. The fan-out stops at the first recipient whose write fails.
    fn handle_broadcast(&mut self, from: SessionId, text: String) {
        let Some(sender) = self.registry.get(from) else {
            return;
        };
        let line = format!("{}: {}", sender.name, text);
        let line = self.apply_filter(line);
        let line = format!("{} {}", timestamp(), line);
        info!("{line}");

        let recipients = self.registry.snapshot();
        tokio::spawn(async move {
            let line = format!("{line}\n");
            for session in recipients {
                if session.send(line.clone()).await.is_err() {
                    break;
                }
            }
        });
    }

    /// Handle a `/list` request
    ///
    /// Sends the requester every other live session's name, one per line,
    /// in registration order.
    async fn handle_list(&mut self, from: SessionId) {
        let Some(requester) = self.registry.get(from) else {
            return;
        };
        info!("{} executed the command \"/list\"", requester.name);

        let names: Vec<String> = self
            .registry
            .iter()
            .filter(|s| s.id != from)
            .map(|s| format!("{}\n", s.name))
            .collect();
        for name in names {
            if requester.send(name).await.is_err() {
                break;
            }
        }
    }

    /// Handle a direct message
    ///
    /// Replies with a notice when the target is unknown or is the sender
    /// itself. Otherwise echoes the formatted line back to the sender
    /// (timestamped, unfiltered) and delivers the filtered copy to the
    /// target on a spawned task.
    async fn handle_direct(&mut self, from: SessionId, target: String, body: String) {
        let Some(sender) = self.registry.get(from) else {
            return;
        };
        match self.registry.find_by_username(&target) {
            None => {
                let _ = sender.send("Username does not exist.\n".to_string()).await;
            }
            Some(t) if t.id == from => {
                let _ = sender
                    .send("You cannot message yourself!\n".to_string())
                    .await;
            }
            Some(t) => {
                let line = format!("{} -> {}: {}", sender.name, t.name, body);
                let _ = sender.send(format!("> {} {line}\n", timestamp())).await;

                let line = self.apply_filter(line);
                let line = format!("{} {}", timestamp(), line);
                info!("{line}");

                let recipient = t.clone();
                tokio::spawn(async move {
                    let _ = recipient.send(format!("> {line}\n")).await;
                });
            }
        }
    }

    /// Pass text through the bad-word filter when one is configured
    fn apply_filter(&self, text: String) -> String {
        match &self.filter {
            Some(filter) => filter.filter(&text),
            None => text,
        }
    }
}

/// Wall-clock timestamp in the protocol's `HH:MM:SS` form
fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spawn a server actor and return its command channel
    fn spawn_server(filter: Option<WordFilter>) -> mpsc::Sender<ServerCommand> {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        tokio::spawn(ChatServer::new(cmd_rx, filter).run());
        cmd_tx
    }

    /// Register a fake session and return its id and inbox
    async fn register(
        cmd_tx: &mpsc::Sender<ServerCommand>,
        name: &str,
    ) -> (SessionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        let id = SessionId::next();
        cmd_tx
            .send(ServerCommand::Register {
                id,
                name: name.to_string(),
                sender: tx,
            })
            .await
            .unwrap();
        (id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone_including_sender() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;
        let (_bob, mut bob_rx) = register(&cmd_tx, "bob").await;
        let (_carol, mut carol_rx) = register(&cmd_tx, "carol").await;

        cmd_tx
            .send(ServerCommand::Broadcast {
                from: alice,
                text: "hello".to_string(),
            })
            .await
            .unwrap();

        for rx in [&mut alice_rx, &mut bob_rx, &mut carol_rx] {
            let line = rx.recv().await.unwrap();
            assert!(line.ends_with(" alice: hello\n"), "got {line:?}");
        }
    }

    #[tokio::test]
    async fn test_broadcast_skips_deregistered_session() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;
        let (bob, mut bob_rx) = register(&cmd_tx, "bob").await;

        cmd_tx
            .send(ServerCommand::Deregister {
                id: bob,
                reason: DisconnectReason::Logout,
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Broadcast {
                from: alice,
                text: "anyone there?".to_string(),
            })
            .await
            .unwrap();

        assert!(alice_rx
            .recv()
            .await
            .unwrap()
            .ends_with(" alice: anyone there?\n"));
        // Bob's registry entry (and with it the only sender) is gone.
        assert!(bob_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_applies_filter() {
        let cmd_tx = spawn_server(Some(WordFilter::new(vec!["spam".to_string()])));
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;

        cmd_tx
            .send(ServerCommand::Broadcast {
                from: alice,
                text: "free SPAM here".to_string(),
            })
            .await
            .unwrap();

        let line = alice_rx.recv().await.unwrap();
        assert!(line.ends_with(" alice: free **** here\n"), "got {line:?}");
    }

    #[tokio::test]
    async fn test_direct_delivered_to_target_and_echoed() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;
        let (_bob, mut bob_rx) = register(&cmd_tx, "bob").await;
        let (_carol, mut carol_rx) = register(&cmd_tx, "carol").await;

        cmd_tx
            .send(ServerCommand::Direct {
                from: alice,
                target: "bob".to_string(),
                body: "hello there".to_string(),
            })
            .await
            .unwrap();

        let echo = alice_rx.recv().await.unwrap();
        assert!(echo.starts_with("> "), "got {echo:?}");
        assert!(echo.ends_with(" alice -> bob: hello there\n"), "got {echo:?}");

        let delivery = bob_rx.recv().await.unwrap();
        assert!(delivery.starts_with("> "), "got {delivery:?}");
        assert!(
            delivery.ends_with(" alice -> bob: hello there\n"),
            "got {delivery:?}"
        );

        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_direct_to_unknown_target() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;

        cmd_tx
            .send(ServerCommand::Direct {
                from: alice,
                target: "zed".to_string(),
                body: "hi".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(alice_rx.recv().await.unwrap(), "Username does not exist.\n");
    }

    #[tokio::test]
    async fn test_direct_to_self() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;

        cmd_tx
            .send(ServerCommand::Direct {
                from: alice,
                target: "alice".to_string(),
                body: "hi me".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            alice_rx.recv().await.unwrap(),
            "You cannot message yourself!\n"
        );
    }

    #[tokio::test]
    async fn test_list_excludes_requester_in_order() {
        let cmd_tx = spawn_server(None);
        let (_alice, _alice_rx) = register(&cmd_tx, "alice").await;
        let (bob, mut bob_rx) = register(&cmd_tx, "bob").await;
        let (_carol, _carol_rx) = register(&cmd_tx, "carol").await;

        cmd_tx
            .send(ServerCommand::List { from: bob })
            .await
            .unwrap();

        assert_eq!(bob_rx.recv().await.unwrap(), "alice\n");
        assert_eq!(bob_rx.recv().await.unwrap(), "carol\n");
    }

    #[tokio::test]
    async fn test_list_with_no_other_sessions_is_empty() {
        let cmd_tx = spawn_server(None);
        let (alice, mut alice_rx) = register(&cmd_tx, "alice").await;

        cmd_tx
            .send(ServerCommand::List { from: alice })
            .await
            .unwrap();
        // A later notice arriving first proves the list produced nothing.
        cmd_tx
            .send(ServerCommand::Direct {
                from: alice,
                target: "alice".to_string(),
                body: "ping".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            alice_rx.recv().await.unwrap(),
            "You cannot message yourself!\n"
        );
    }

    #[tokio::test]
    async fn test_deregister_twice_is_a_noop() {
        let cmd_tx = spawn_server(None);
        let (alice, _alice_rx) = register(&cmd_tx, "alice").await;
        let (bob, mut bob_rx) = register(&cmd_tx, "bob").await;

        cmd_tx
            .send(ServerCommand::Deregister {
                id: alice,
                reason: DisconnectReason::Dropped,
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Deregister {
                id: alice,
                reason: DisconnectReason::Logout,
            })
            .await
            .unwrap();

        // Bob is untouched and still reachable.
        cmd_tx
            .send(ServerCommand::Broadcast {
                from: bob,
                text: "still here".to_string(),
            })
            .await
            .unwrap();
        assert!(bob_rx.recv().await.unwrap().ends_with(" bob: still here\n"));
    }
}
