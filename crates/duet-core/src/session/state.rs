//! Per-session state and identifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// URL-safe alphabet used for session ids (64 symbols).
const SESSION_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Unique identifier for a session, shared with both participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a random id of `length` URL-safe characters.
    pub fn generate(length: usize) -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..SESSION_ID_ALPHABET.len());
                SESSION_ID_ALPHABET[idx] as char
            })
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a transport connection.
///
/// Assigned by the transport when a socket is accepted. The core only compares
/// it and uses it as a delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a session a connection is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

/// A pairing slot: one host, at most one guest.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier
    pub id: SessionId,

    /// Connection that created the session
    pub host: ConnectionId,

    /// Connection that joined, if any
    pub guest: Option<ConnectionId>,
}

impl Session {
    pub fn new(id: SessionId, host: ConnectionId) -> Self {
        Self {
            id,
            host,
            guest: None,
        }
    }

    /// Whether a guest is currently bound.
    pub fn is_full(&self) -> bool {
        self.guest.is_some()
    }

    /// The other party of `connection`, if `connection` is bound here and the
    /// other side is present.
    pub fn counterpart(&self, connection: &ConnectionId) -> Option<&ConnectionId> {
        if &self.host == connection {
            self.guest.as_ref()
        } else if self.guest.as_ref() == Some(connection) {
            Some(&self.host)
        } else {
            None
        }
    }
}
