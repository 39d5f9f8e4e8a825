//! WebSocket handler for paired-session traffic.
//!
//! Clients connect to `/ws`. Each socket gets its own connection identity;
//! text frames go to the connection router and events addressed to the
//! connection are written back as text frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use duet_core::ConnectionId;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use super::SharedState;

/// Handler for GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<SharedState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<SharedState>) {
    let (mut sender, mut receiver) = socket.split();
    let connection = ConnectionId::new();

    let mut outbound = state.router.connect(connection.clone());

    // Feed incoming frames to the router
    let router = state.router.clone();
    let inbound_id = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => router.handle_frame(&inbound_id, text.as_str()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log::debug!("WebSocket receive error on {}: {}", inbound_id, e);
                    break;
                }
            }
        }
    });

    // Write events addressed to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let json = match event.to_frame() {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    // Whichever side ends first tears the connection down
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    state.router.disconnect(&connection);
}
