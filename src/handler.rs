//! WebSocket connection handler
//!
//! Owns one connection's lifecycle: WebSocket handshake, the registration
//! read, the envelope read loop, and the session's single-writer outbound
//! task. Routing decisions that need the registry go to the ChatServer
//! actor; purely local protocol errors are answered directly.

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{self, Envelope};
use crate::server::{DisconnectReason, ServerCommand};
use crate::types::SessionId;

/// Buffer size for a session's outbound text channel
const OUTBOUND_BUFFER_SIZE: usize = 32;

type WsReader = SplitStream<WebSocketStream<TcpStream>>;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, reads the peer's display name from the
/// first text frame, registers the session with the ChatServer, then runs
/// the read loop until the peer logs out or the connection ends.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Registration read: the first text frame carries the bare display name.
    // Blocks only this connection's task, never the accept loop.
    let name = loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => break text.to_string(),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(_)) | Some(Err(_)) | None => {
                debug!("Peer {} left before registering", peer_addr);
                return Ok(());
            }
        }
    };

    let id = SessionId::next();
    info!("Session {} connected from {}", id, peer_addr);

    // Outbound channel for server -> peer text
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER_SIZE);

    if cmd_tx
        .send(ServerCommand::Register {
            id,
            name,
            sender: msg_tx.clone(),
        })
        .await
        .is_err()
    {
        error!("Failed to register session {} - server closed", id);
        return Err(AppError::ChannelSend);
    }

    // Write task: the session's single writer. Every outbound line passes
    // through one channel, so concurrent deliveries never interleave frames.
    let write_task = tokio::spawn(async move {
        while let Some(text) = msg_rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                debug!("WebSocket send failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for session");

        let _ = ws_sender.close().await;
    });

    let reason = read_loop(&mut ws_receiver, id, &cmd_tx, &msg_tx).await;

    // Deregister exactly once; the registry drops its sender, our clone goes
    // next, and the write task drains and closes the socket.
    let _ = cmd_tx.send(ServerCommand::Deregister { id, reason }).await;
    drop(msg_tx);
    let _ = write_task.await;

    debug!("Session {} handler finished", id);
    Ok(())
}

/// Decode envelopes and dispatch them until the session ends
///
/// Local protocol errors (blank chat line, malformed direct command) are
/// answered through the session's own outbound channel without a round-trip
/// to the actor. End-of-stream and transport errors are not errors to report
/// upward: they resolve to an abrupt [`DisconnectReason`].
async fn read_loop(
    ws_receiver: &mut WsReader,
    id: SessionId,
    cmd_tx: &mpsc::Sender<ServerCommand>,
    msg_tx: &mpsc::Sender<String>,
) -> DisconnectReason {
    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let envelope = match serde_json::from_str::<Envelope>(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Invalid envelope from session {}: {}", id, e);
                        continue;
                    }
                };
                match dispatch(envelope, id, cmd_tx, msg_tx).await {
                    Ok(true) => continue,
                    Ok(false) => return DisconnectReason::Logout,
                    Err(_) => return DisconnectReason::Dropped,
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Session {} sent close frame", id);
                return DisconnectReason::Dropped;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(_) => {
                // Binary and other frame types are ignored
            }
            Err(e) => {
                debug!("Transport error for session {}: {}", id, e);
                return DisconnectReason::Dropped;
            }
        }
    }
    DisconnectReason::Dropped
}

/// Dispatch one decoded envelope
///
/// Returns `Ok(false)` when the envelope asks for a logout (explicitly or
/// via an unknown kind), `Err` when a channel to the server or to the peer
/// is gone.
async fn dispatch(
    envelope: Envelope,
    id: SessionId,
    cmd_tx: &mpsc::Sender<ServerCommand>,
    msg_tx: &mpsc::Sender<String>,
) -> Result<bool, AppError> {
    match envelope {
        Envelope::Chat { text } => {
            if text.trim().is_empty() {
                reply(msg_tx, "You cannot send a blank message.\n").await?;
            } else {
                command(cmd_tx, ServerCommand::Broadcast { from: id, text }).await?;
            }
        }
        Envelope::List => {
            command(cmd_tx, ServerCommand::List { from: id }).await?;
        }
        Envelope::Direct { text } => match message::parse_direct(&text) {
            Some((target, body)) => {
                let cmd = ServerCommand::Direct {
                    from: id,
                    target: target.to_string(),
                    body: body.to_string(),
                };
                command(cmd_tx, cmd).await?;
            }
            None => {
                reply(msg_tx, "You need to specify the username AND the message.\n").await?;
            }
        },
        Envelope::Logout | Envelope::Unknown => {
            debug!("Session {} requested logout", id);
            return Ok(false);
        }
    }
    Ok(true)
}

/// Send a notice straight back to this session's peer
async fn reply(msg_tx: &mpsc::Sender<String>, notice: &str) -> Result<(), AppError> {
    msg_tx
        .send(notice.to_string())
        .await
        .map_err(|_| AppError::ChannelSend)
}

/// Send a command to the ChatServer actor
async fn command(
    cmd_tx: &mpsc::Sender<ServerCommand>,
    cmd: ServerCommand,
) -> Result<(), AppError> {
    cmd_tx.send(cmd).await.map_err(|_| AppError::ChannelSend)
}
