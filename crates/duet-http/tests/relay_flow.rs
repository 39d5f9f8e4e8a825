//! End-to-end pairing and relay over real WebSocket connections.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use duet_core::{
    ConnectionRouter, Outbox, ServerEvent, SessionId, SessionRegistry, SharedRegistry,
};
use duet_http::{serve, SharedState};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

struct TestServer {
    addr: SocketAddr,
    registry: SharedRegistry,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let registry: SharedRegistry = Arc::new(Mutex::new(SessionRegistry::new()));
        let router = ConnectionRouter::new(Arc::clone(&registry), Arc::new(Outbox::new()));
        let state = Arc::new(SharedState::new(router));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, state, None, async move {
            rx.await.ok();
        }));

        Self {
            addr,
            registry,
            shutdown: Some(tx),
        }
    }

    async fn client(&self) -> Client {
        let url = format!("ws://{}/ws", self.addr);
        let (ws, _) = connect_async(url).await.unwrap();
        Client { ws }
    }

    fn session_count(&self) -> usize {
        self.registry.lock().unwrap().session_count()
    }

    fn guest_of(&self, id: &SessionId) -> Option<Option<String>> {
        let registry = self.registry.lock().unwrap();
        registry
            .get_session(id)
            .map(|s| s.guest.as_ref().map(|g| g.0.clone()))
    }

    /// Poll until the server has processed a disconnect.
    async fn wait_for_sessions(&self, expected: usize) {
        for _ in 0..100 {
            if self.session_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Expected {} sessions, found {}", expected, self.session_count());
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    async fn send(&mut self, frame: Value) {
        self.ws
            .send(Message::Text(frame.to_string().into()))
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> ServerEvent {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    async fn expect_silence(&mut self) {
        let result = tokio::time::timeout(QUIET_PERIOD, self.ws.next()).await;
        assert!(result.is_err(), "expected no frame, got {:?}", result);
    }

    async fn create(&mut self) -> SessionId {
        self.send(json!({"event": "create_session"})).await;
        match self.recv().await {
            ServerEvent::SessionCreated { session_id } => session_id,
            other => panic!("Expected session_created, got {:?}", other),
        }
    }

    async fn join(&mut self, id: &SessionId) -> ServerEvent {
        self.send(json!({"event": "join_session", "data": {"sessionId": id}}))
            .await;
        self.recv().await
    }

    async fn close(mut self) {
        self.ws.close(None).await.ok();
    }
}

fn error(message: &str) -> ServerEvent {
    ServerEvent::Error {
        message: message.to_string(),
    }
}

#[tokio::test]
async fn pairing_relay_and_departure() {
    let server = TestServer::start().await;
    let mut a = server.client().await;
    let mut b = server.client().await;

    let x = a.create().await;
    assert_eq!(x.as_str().len(), 10);

    let joined = b.join(&x).await;
    assert_eq!(
        joined,
        ServerEvent::SessionJoined {
            session_id: x.clone()
        }
    );
    assert_eq!(a.recv().await, ServerEvent::GuestJoined {});

    a.send(json!({
        "event": "playback_event",
        "data": {"sessionId": x.as_str(), "event": "play", "data": {"t": 12}}
    }))
    .await;
    assert_eq!(
        b.recv().await,
        ServerEvent::PlaybackEvent {
            event: json!("play"),
            data: json!({"t": 12}),
        }
    );
    a.expect_silence().await;

    b.close().await;
    assert_eq!(a.recv().await, ServerEvent::PartnerLeft {});
    assert_eq!(server.guest_of(&x), Some(None));

    a.close().await;
    server.wait_for_sessions(0).await;
    assert_eq!(server.guest_of(&x), None);
}

#[tokio::test]
async fn join_errors_reach_only_requester() {
    let server = TestServer::start().await;
    let mut host = server.client().await;
    let mut guest = server.client().await;
    let mut late = server.client().await;

    let missing = late.join(&SessionId::from("nothing-here")).await;
    assert_eq!(missing, error("Session not found."));

    let id = host.create().await;
    guest.join(&id).await;
    host.recv().await;

    let full = late.join(&id).await;
    assert_eq!(full, error("Session is full."));
    host.expect_silence().await;
    guest.expect_silence().await;
}

#[tokio::test]
async fn host_departure_closes_session_for_everyone() {
    let server = TestServer::start().await;
    let mut host = server.client().await;
    let mut guest = server.client().await;

    let id = host.create().await;
    guest.join(&id).await;
    host.recv().await;

    host.close().await;
    assert_eq!(guest.recv().await, ServerEvent::PartnerLeft {});
    server.wait_for_sessions(0).await;

    let mut newcomer = server.client().await;
    assert_eq!(newcomer.join(&id).await, error("Session not found."));

    // The orphaned guest is free to host again
    let fresh = guest.create().await;
    assert_ne!(fresh, id);
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    client
        .ws
        .send(Message::Text("definitely not json".into()))
        .await
        .unwrap();
    client.send(json!({"event": "format_disk"})).await;
    client.expect_silence().await;

    // Connection stays usable
    let id = client.create().await;
    assert!(!id.as_str().is_empty());
    assert_eq!(server.session_count(), 1);
}
