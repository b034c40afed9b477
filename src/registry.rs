//! Session registry
//!
//! The server-wide table of live sessions, keyed by id and searchable by
//! display name. Owned exclusively by the `ChatServer` actor task, which is
//! the registry's mutual-exclusion discipline: every mutation and every
//! delivery-time traversal happens on that one task.

use crate::session::Session;
use crate::types::SessionId;

/// Insertion-ordered collection of live sessions
///
/// Invariant: no two live sessions share a display name. `add` enforces this
/// by appending the session's id to a colliding name; ids are never reused,
/// so the disambiguated name is unique as well.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Vec<Session>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Register a session, disambiguating its name on collision
    ///
    /// Returns the display name the session was registered under.
    pub fn add(&mut self, mut session: Session) -> String {
        if self.find_by_username(&session.name).is_some() {
            session.name = format!("{}{}", session.name, session.id);
        }
        let name = session.name.clone();
        self.sessions.push(session);
        name
    }

    /// Remove a session by id
    ///
    /// Idempotent: removing an id that is absent (or was already removed)
    /// is a no-op. Returns the removed session, if any.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let index = self.find_by_id(id)?;
        Some(self.sessions.remove(index))
    }

    /// Look up a session by display name
    pub fn find_by_username(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// Look up a session's index by id
    pub fn find_by_id(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// Get a session by id
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.find_by_id(id).map(|i| &self.sessions[i])
    }

    /// Iterate live sessions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Clone the current session list for a delivery fan-out
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry has no live sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
