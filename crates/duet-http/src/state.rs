//! Shared state for the HTTP server.
//!
//! Wraps the connection router handed in at startup.

use duet_core::ConnectionRouter;

/// Shared state available to all HTTP handlers.
#[derive(Clone)]
pub struct SharedState {
    /// Routes socket traffic into the session registry.
    pub router: ConnectionRouter,
}

impl SharedState {
    /// Create a new shared state around the given router.
    pub fn new(router: ConnectionRouter) -> Self {
        Self { router }
    }
}
