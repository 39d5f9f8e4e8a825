//! SessionRegistry - owner of every live session and connection binding.

use super::state::{ConnectionId, Role, Session, SessionId};
use crate::config::RelayConfig;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session is full: {0}")]
    Full(SessionId),

    #[error("Connection already bound to session: {0}")]
    AlreadyInSession(SessionId),
}

impl SessionError {
    /// Message reported to the requesting client.
    pub fn client_message(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "Session not found.",
            SessionError::Full(_) => "Session is full.",
            SessionError::AlreadyInSession(_) => "Already in a session.",
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinReceipt {
    pub session_id: SessionId,
    /// Host to notify that a guest arrived.
    pub host: ConnectionId,
}

/// What a disconnect did to the session the connection was bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    /// Side the disconnected connection held.
    pub role: Role,
    /// Remaining participant to tell about the departure.
    pub partner: Option<ConnectionId>,
}

#[derive(Debug, Clone)]
struct Binding {
    session_id: SessionId,
    role: Role,
}

/// Manages all live sessions.
///
/// Keeps a reverse index from connection to session so disconnects resolve
/// without scanning. Every mutation updates both maps together.
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    bindings: HashMap<ConnectionId, Binding>,
    config: RelayConfig,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            bindings: HashMap::new(),
            config,
        }
    }

    /// Create a session hosted by `connection`, returns its fresh id.
    pub fn create_session(&mut self, connection: ConnectionId) -> Result<SessionId, SessionError> {
        if let Some(binding) = self.bindings.get(&connection) {
            return Err(SessionError::AlreadyInSession(binding.session_id.clone()));
        }

        let id = self.fresh_id();
        self.bindings.insert(
            connection.clone(),
            Binding {
                session_id: id.clone(),
                role: Role::Host,
            },
        );
        self.sessions
            .insert(id.clone(), Session::new(id.clone(), connection));
        Ok(id)
    }

    /// Bind `connection` as the guest of `session_id`.
    pub fn join_session(
        &mut self,
        connection: ConnectionId,
        session_id: &SessionId,
    ) -> Result<JoinReceipt, SessionError> {
        if let Some(binding) = self.bindings.get(&connection) {
            return Err(SessionError::AlreadyInSession(binding.session_id.clone()));
        }

        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        if session.is_full() {
            return Err(SessionError::Full(session_id.clone()));
        }

        session.guest = Some(connection.clone());
        self.bindings.insert(
            connection,
            Binding {
                session_id: session_id.clone(),
                role: Role::Guest,
            },
        );

        Ok(JoinReceipt {
            session_id: session_id.clone(),
            host: session.host.clone(),
        })
    }

    /// Who an event from `connection` in `session_id` should reach.
    ///
    /// `None` when the session is unknown, the sender is not bound to it, or
    /// the other side is absent.
    pub fn relay_target(
        &self,
        connection: &ConnectionId,
        session_id: &SessionId,
    ) -> Option<&ConnectionId> {
        self.sessions.get(session_id)?.counterpart(connection)
    }

    /// Drop whatever binding `connection` holds.
    ///
    /// A departing host destroys its session; a departing guest frees the slot.
    pub fn handle_disconnect(&mut self, connection: &ConnectionId) -> Option<Departure> {
        let binding = self.bindings.remove(connection)?;

        match binding.role {
            Role::Host => {
                let session = self.sessions.remove(&binding.session_id)?;
                if let Some(guest) = &session.guest {
                    self.bindings.remove(guest);
                }
                Some(Departure {
                    session_id: binding.session_id,
                    role: Role::Host,
                    partner: session.guest,
                })
            }
            Role::Guest => {
                let session = self.sessions.get_mut(&binding.session_id)?;
                session.guest = None;
                Some(Departure {
                    session_id: binding.session_id,
                    role: Role::Guest,
                    partner: Some(session.host.clone()),
                })
            }
        }
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Session `connection` is bound to, if any.
    pub fn session_of(&self, connection: &ConnectionId) -> Option<&SessionId> {
        self.bindings.get(connection).map(|b| &b.session_id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of connections bound as host or guest.
    pub fn bound_connection_count(&self) -> usize {
        self.bindings.len()
    }

    fn fresh_id(&self) -> SessionId {
        loop {
            let id = SessionId::generate(self.config.session_id_length);
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
