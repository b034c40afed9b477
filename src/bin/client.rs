//! Companion line-oriented chat client
//!
//! Connects to the server, sends the display name as the first frame, then
//! turns stdin lines into envelopes while printing server text verbatim.
//!
//! Command surface parsed locally before anything is sent:
//! - `/logout` → logout envelope, then exit
//! - `/list` → list envelope
//! - a line beginning with `/msg` → direct envelope carrying the raw line
//! - any other line starting with `/` → rejected as an invalid command
//! - a blank line → empty chat envelope (the server replies with a notice)

use std::env;
use std::io::Write;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use chat_relay::Envelope;

/// Default display name
const DEFAULT_USERNAME: &str = "Anonymous";

/// Default server port
const DEFAULT_PORT: u16 = 1500;

/// Default server host
const DEFAULT_HOST: &str = "localhost";

/// Usage: client [username] [port] [host]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let username = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
    let port: u16 = match args.get(2) {
        Some(port) => port.parse()?,
        None => DEFAULT_PORT,
    };
    let host = args
        .get(3)
        .cloned()
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let url = format!("ws://{host}:{port}");
    let (ws_stream, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(_) => {
            println!("Cannot connect to server.");
            return Ok(());
        }
    };
    println!("Connection accepted {url}");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // First frame: the bare display name.
    ws_sender.send(Message::Text(username.into())).await?;

    // Server lines arrive newline-terminated; print them verbatim.
    let read_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
                Ok(Message::Close(_)) | Err(_) => {
                    println!("Server has disconnected.");
                    break;
                }
                Ok(_) => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let envelope = if line.trim().is_empty() {
            Envelope::Chat {
                text: String::new(),
            }
        } else if line == "/logout" {
            ws_sender
                .send(Message::Text(serde_json::to_string(&Envelope::Logout)?.into()))
                .await?;
            break;
        } else if line == "/list" {
            Envelope::List
        } else if line.starts_with("/msg") {
            Envelope::Direct { text: line }
        } else if line.starts_with('/') {
            println!("\"{line}\" is an invalid command.");
            continue;
        } else {
            Envelope::Chat { text: line }
        };
        ws_sender
            .send(Message::Text(serde_json::to_string(&envelope)?.into()))
            .await?;
    }

    let _ = ws_sender.close().await;
    read_task.abort();
    Ok(())
}
