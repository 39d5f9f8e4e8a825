//! ConnectionRouter - dispatches client events to the session registry.
//!
//! The router owns no session state. It takes a shared handle to the registry
//! and the outbox, runs each inbound event against the registry under a single
//! lock and queues the resulting notifications before releasing it. Queueing
//! never blocks, so notifications reach each connection in the same order as
//! the state changes that caused them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::outbox::{Outbox, OutboxReceiver};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::session::{ConnectionId, Role, SessionId, SessionRegistry};

/// Registry handle shared between the router and read-only observers.
pub type SharedRegistry = Arc<Mutex<SessionRegistry>>;

/// An outbound event addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub event: ServerEvent,
}

impl Delivery {
    fn new(to: ConnectionId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}

/// Routes transport notifications to the session registry.
#[derive(Clone)]
pub struct ConnectionRouter {
    registry: SharedRegistry,
    outbox: Arc<Outbox>,
}

impl ConnectionRouter {
    pub fn new(registry: SharedRegistry, outbox: Arc<Outbox>) -> Self {
        Self { registry, outbox }
    }

    /// Register a newly accepted connection and return its delivery channel.
    pub fn connect(&self, connection: ConnectionId) -> OutboxReceiver {
        log::debug!("Connection {} opened", connection);
        self.outbox.register(connection)
    }

    /// Decode a text frame from `connection` and dispatch it.
    ///
    /// Undecodable frames and unknown events are logged and dropped.
    pub fn handle_frame(&self, connection: &ConnectionId, text: &str) {
        match ClientEvent::parse(text) {
            Ok(event) => self.handle_event(connection, event),
            Err(e) => log::warn!("Ignoring frame from {}: {}", connection, e),
        }
    }

    /// Dispatch one client event and deliver the resulting notifications.
    pub fn handle_event(&self, connection: &ConnectionId, event: ClientEvent) {
        log::debug!("{} from {}", event.name(), connection);
        let mut registry = self.registry();
        let deliveries = dispatch(&mut registry, connection, event);
        self.send_all(deliveries);
    }

    /// Handle a transport-reported disconnect.
    pub fn disconnect(&self, connection: &ConnectionId) {
        let mut registry = self.registry();

        if let Some(departure) = registry.handle_disconnect(connection) {
            match departure.role {
                Role::Host => log::info!(
                    "Host {} left, session {} closed",
                    connection,
                    departure.session_id
                ),
                Role::Guest => log::info!(
                    "Guest {} left session {}",
                    connection,
                    departure.session_id
                ),
            }
            if let Some(partner) = departure.partner {
                self.send_all(vec![Delivery::new(partner, ServerEvent::PartnerLeft {})]);
            }
        }

        self.outbox.unregister(connection);
        drop(registry);
        log::debug!("Connection {} closed", connection);
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.registry().session_count()
    }

    /// Number of connections with an open delivery channel.
    pub fn connection_count(&self) -> usize {
        self.outbox.connection_count()
    }

    fn send_all(&self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            if !self.outbox.deliver(&delivery.to, delivery.event) {
                log::debug!("Delivery to {} dropped", delivery.to);
            }
        }
    }

    fn registry(&self) -> MutexGuard<'_, SessionRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run `event` against the registry and collect the notifications it causes.
///
/// Callers hold the registry lock until the deliveries are queued.
fn dispatch(
    registry: &mut SessionRegistry,
    connection: &ConnectionId,
    event: ClientEvent,
) -> Vec<Delivery> {
    match event {
        ClientEvent::CreateSession => match registry.create_session(connection.clone()) {
            Ok(session_id) => {
                log::info!("Session {} created by {}", session_id, connection);
                vec![Delivery::new(
                    connection.clone(),
                    ServerEvent::SessionCreated { session_id },
                )]
            }
            Err(e) => {
                log::debug!("Create rejected for {}: {}", connection, e);
                vec![error_delivery(connection, e.client_message())]
            }
        },

        ClientEvent::JoinSession { session_id } => {
            // A missing id can never name a live session.
            let session_id = session_id.unwrap_or_else(|| SessionId(String::new()));
            match registry.join_session(connection.clone(), &session_id) {
                Ok(receipt) => {
                    log::info!("Guest {} joined session {}", connection, receipt.session_id);
                    vec![
                        Delivery::new(receipt.host, ServerEvent::GuestJoined {}),
                        Delivery::new(
                            connection.clone(),
                            ServerEvent::SessionJoined {
                                session_id: receipt.session_id,
                            },
                        ),
                    ]
                }
                Err(e) => {
                    log::debug!("Join rejected for {}: {}", connection, e);
                    vec![error_delivery(connection, e.client_message())]
                }
            }
        }

        ClientEvent::PlaybackEvent {
            session_id,
            event,
            data,
        } => {
            let target = session_id
                .as_ref()
                .and_then(|id| registry.relay_target(connection, id));
            match target {
                Some(target) => {
                    log::debug!("Relaying {} from {} to {}", event, connection, target);
                    vec![Delivery::new(
                        target.clone(),
                        ServerEvent::PlaybackEvent { event, data },
                    )]
                }
                None => Vec::new(),
            }
        }
    }
}

fn error_delivery(connection: &ConnectionId, message: &str) -> Delivery {
    Delivery::new(
        connection.clone(),
        ServerEvent::Error {
            message: message.to_string(),
        },
    )
}

// ============================================================================
// TESTS
// ============================================================================
