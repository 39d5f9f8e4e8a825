//! # duet-core
//!
//! Core pairing and relay logic for Duet, the two-party playback sync server.
//!
//! This crate is transport-agnostic and can be driven by:
//! - The WebSocket server (duet-http)
//! - Tests, through the outbox receivers
//!
//! ## Key Concepts
//!
//! - **Session**: A pairing slot owned by a host connection, joinable by one guest
//! - **SessionRegistry**: Sole owner and mutator of session state
//! - **ConnectionRouter**: Turns inbound client events into registry calls and deliveries
//! - **Outbox**: Per-connection delivery channels for outbound events

pub mod config;
pub mod outbox;
pub mod protocol;
pub mod router;
pub mod session;

// Re-export commonly used types
pub use config::RelayConfig;
pub use outbox::Outbox;
pub use protocol::{ClientEvent, ServerEvent};
pub use router::{ConnectionRouter, Delivery, SharedRegistry};
pub use session::{ConnectionId, Session, SessionError, SessionId, SessionRegistry};
