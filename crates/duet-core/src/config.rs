//! Relay configuration.

/// Default length of generated session ids.
pub const DEFAULT_SESSION_ID_LENGTH: usize = 10;

/// Shortest session id the registry will generate.
pub const MIN_SESSION_ID_LENGTH: usize = 6;

/// Longest session id the registry will generate.
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Settings for the session registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Number of characters in a generated session id.
    pub session_id_length: usize,
}

impl RelayConfig {
    /// Create a config with the given id length, clamped to the supported range.
    pub fn with_session_id_length(length: usize) -> Self {
        Self {
            session_id_length: length.clamp(MIN_SESSION_ID_LENGTH, MAX_SESSION_ID_LENGTH),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session_id_length: DEFAULT_SESSION_ID_LENGTH,
        }
    }
}
