//! Wire protocol definitions
//!
//! JSON-based client-to-server protocol using Serde's tagged enum
//! for type-safe deserialization. Server-to-client traffic is plain text
//! displayed verbatim by the peer, so no server message enum exists.

use serde::{Deserialize, Serialize};

/// Client → Server envelope
///
/// One envelope per WebSocket text frame, tagged by `kind`. The first frame
/// of a connection is not an envelope but the bare display name.
///
/// An unrecognized `kind` decodes as [`Envelope::Unknown`], which the session
/// treats as an explicit logout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    /// Free-form chat line, broadcast to everyone
    Chat { text: String },
    /// Request the display names of all other live sessions
    List,
    /// Direct message; `text` carries the raw `/msg` command line
    Direct { text: String },
    /// Clean logout
    Logout,
    /// Any unrecognized kind
    #[serde(other)]
    Unknown,
}

/// Tokenize a raw `/msg` command line into `(target, body)`.
///
/// The first whitespace-delimited token is the command word, the second is
/// the target username, and the body is the remainder of the line with
/// leading whitespace stripped and internal whitespace kept verbatim.
///
/// Returns `None` when no body can be derived (fewer than three tokens, or
/// nothing but whitespace after the target), in which case the caller replies
/// with the usage notice. A body that starts with extra delimiters loses them.
pub fn parse_direct(line: &str) -> Option<(&str, &str)> {
    let (_command, rest) = split_token(line)?;
    let (target, rest) = split_token(rest)?;
    let body = rest.trim_start();
    if body.is_empty() {
        return None;
    }
    Some((target, body))
}

/// Split one leading whitespace-delimited token off `s`.
fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}
