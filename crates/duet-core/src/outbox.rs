//! Point-to-point delivery of outbound events.
//!
//! Each connected client registers a channel here and the transport drains
//! the receiving half onto its socket. Sends never block: a message for a
//! connection that is gone is dropped.
//!
//! # Example
//!
//! ```rust
//! use duet_core::outbox::Outbox;
//! use duet_core::protocol::ServerEvent;
//! use duet_core::session::ConnectionId;
//!
//! let outbox = Outbox::new();
//! let conn = ConnectionId::new();
//!
//! // Register the connection
//! let mut rx = outbox.register(conn.clone());
//!
//! // Deliver an event
//! outbox.deliver(&conn, ServerEvent::GuestJoined {});
//!
//! // Receive the event (in async context)
//! // let event = rx.recv().await.unwrap();
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::protocol::ServerEvent;
use crate::session::ConnectionId;

/// Receiving half handed to the transport for one connection.
pub type OutboxReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Per-connection delivery channels, keyed by connection identity.
#[derive(Default)]
pub struct Outbox {
    senders: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a delivery channel for `connection`.
    ///
    /// Registering the same connection again replaces its previous channel.
    pub fn register(&self, connection: ConnectionId) -> OutboxReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(connection, tx);
        rx
    }

    /// Close the delivery channel for `connection`.
    pub fn unregister(&self, connection: &ConnectionId) {
        self.lock().remove(connection);
    }

    /// Queue `event` for `connection`.
    ///
    /// Returns false if the connection is unknown or its receiver was dropped.
    pub fn deliver(&self, connection: &ConnectionId, event: ServerEvent) -> bool {
        let senders = self.lock();
        match senders.get(connection) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                log::debug!("Dropping event for unknown connection {}", connection);
                false
            }
        }
    }

    /// Get the current number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// TESTS
// ============================================================================
