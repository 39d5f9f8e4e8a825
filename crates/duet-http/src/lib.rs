//! HTTP server exposing the Duet relay over WebSocket.
//!
//! Routes:
//! - `GET /ws` - WebSocket upgrade, one connection identity per socket
//! - `GET /api/health` - liveness plus session/connection counts
//! - static files from an optional directory as the fallback

mod routes;
mod state;
mod websocket;

use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub use routes::HealthResponse;
pub use state::SharedState;

/// Listening and static-file settings for the server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    /// Directory served for any path not matched by a route.
    pub static_dir: Option<PathBuf>,
}

impl ServerOptions {
    /// Parse `host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: None,
        }
    }
}

/// Build the axum application.
pub fn app(state: Arc<SharedState>, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/ws", get(websocket::ws_handler))
        .route("/api/health", get(routes::health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<SharedState>,
    static_dir: Option<PathBuf>,
    shutdown: F,
) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Relay listening on ws://{}/ws", addr);
    }

    axum::serve(listener, app(state, static_dir))
        .with_graceful_shutdown(async move {
            shutdown.await;
            log::info!("Relay shutting down");
        })
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Bind to the configured address and serve until `shutdown` resolves.
pub async fn run<F>(
    options: ServerOptions,
    state: Arc<SharedState>,
    shutdown: F,
) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = options.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    serve(listener, state, options.static_dir, shutdown).await
}

// ============================================================================
// TESTS
// ============================================================================
