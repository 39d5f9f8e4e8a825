//! Session pairing state.
//!
//! A session is created by a host connection and admits one guest. The
//! registry is the only place session state changes.

mod registry;
mod state;

pub use registry::{Departure, JoinReceipt, SessionError, SessionRegistry};
pub use state::{ConnectionId, Role, Session, SessionId};
