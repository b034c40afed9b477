//! Basic type definitions for the chat server
//!
//! Provides a newtype wrapper for type safety:
//! - `SessionId`: monotonic integer session identifier

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique session identifier (newtype pattern)
///
/// Wraps a monotonically increasing `u64` allocated from a process-wide
/// counter. Ids are unique for the server's lifetime and never reused,
/// so a display name disambiguated with its session's id stays unique too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate the next session id
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
