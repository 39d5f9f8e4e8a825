//! Plain HTTP routes.

use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;

use super::SharedState;

/// Response body for GET /api/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Live sessions in the registry.
    pub sessions: usize,
    /// Open WebSocket connections.
    pub connections: usize,
}

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<Arc<SharedState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.router.session_count(),
        connections: state.router.connection_count(),
    })
}
