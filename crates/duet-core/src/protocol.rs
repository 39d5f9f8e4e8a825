//! Wire protocol between clients and the relay.
//!
//! Every frame in either direction is a JSON object of the form
//! `{"event": "<name>", "data": {...}}`. Inbound frames may omit `data`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;

/// Raw inbound frame before the event name is resolved.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct JoinSessionFields {
    #[serde(rename = "sessionId", default)]
    session_id: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct PlaybackFields {
    #[serde(rename = "sessionId", default)]
    session_id: serde_json::Value,
    #[serde(default)]
    event: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

/// Event sent by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CreateSession,
    JoinSession {
        /// `None` when the client sent no id.
        session_id: Option<SessionId>,
    },
    PlaybackEvent {
        session_id: Option<SessionId>,
        /// Application event name, passed through untouched.
        event: serde_json::Value,
        /// Application payload, passed through untouched.
        data: serde_json::Value,
    },
}

/// Reasons an inbound frame could not become a [`ClientEvent`].
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

impl ClientEvent {
    /// Decode a text frame.
    ///
    /// Numeric session ids are accepted as their decimal text. Other
    /// field-level problems (missing or mistyped ids) are tolerated and show up
    /// as `None` ids; only an unreadable envelope or unknown event name fails.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: InboundFrame = serde_json::from_str(text)?;

        match frame.event.as_str() {
            "create_session" => Ok(ClientEvent::CreateSession),
            "join_session" => {
                let fields: JoinSessionFields = decode_fields(frame.data);
                Ok(ClientEvent::JoinSession {
                    session_id: session_id_from(&fields.session_id),
                })
            }
            "playback_event" => {
                let fields: PlaybackFields = decode_fields(frame.data);
                Ok(ClientEvent::PlaybackEvent {
                    session_id: session_id_from(&fields.session_id),
                    event: fields.event,
                    data: fields.data,
                })
            }
            other => Err(FrameError::UnknownEvent(other.to_string())),
        }
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateSession => "create_session",
            ClientEvent::JoinSession { .. } => "join_session",
            ClientEvent::PlaybackEvent { .. } => "playback_event",
        }
    }
}

fn session_id_from(value: &serde_json::Value) -> Option<SessionId> {
    match value {
        serde_json::Value::String(s) => Some(SessionId(s.clone())),
        serde_json::Value::Number(n) => Some(SessionId(n.to_string())),
        _ => None,
    }
}

fn decode_fields<T: Default + DeserializeOwned>(data: serde_json::Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

/// Event sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionCreated {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    SessionJoined {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    GuestJoined {},
    Error {
        message: String,
    },
    PlaybackEvent {
        event: serde_json::Value,
        data: serde_json::Value,
    },
    PartnerLeft {},
}

impl ServerEvent {
    /// Serialize to a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
