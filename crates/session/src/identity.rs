//! Session identity.
//!
//! The session code is assigned by the relay, never derived locally. The
//! host only re-chunks it for display so a person can read it over the
//! phone ("123 456") and copy it without ambiguity.

use serde::Serialize;

/// Display group width for session codes.
pub const SESSION_ID_GROUP_WIDTH: usize = 3;

/// Re-chunk a raw relay-assigned code into width-3 groups joined by single
/// spaces. A length that is not a multiple of the width leaves a shorter
/// final group; no padding, no truncation. Pure and referentially
/// transparent.
pub fn format_session_id(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    chars
        .chunks(SESSION_ID_GROUP_WIDTH)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate the stable identifier for this host installation.
pub fn generate_service_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The active session's identity, held by the conductor while connected.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Signaling relay endpoint this session is connected to.
    pub server_host: String,

    /// Raw relay-assigned session code; empty until assignment arrives.
    pub session_id: String,

    /// Wall-clock time the connection was established (RFC 3339).
    pub connected_at: String,
}

impl SessionInfo {
    pub fn new(server_host: impl Into<String>) -> Self {
        Self {
            server_host: server_host.into(),
            session_id: String::new(),
            connected_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Install a relay-assigned code, replacing any previous one.
    pub fn assign_session_id(&mut self, raw: impl Into<String>) {
        self.session_id = raw.into();
    }

    /// The session code formatted for display.
    pub fn formatted_session_id(&self) -> String {
        format_session_id(&self.session_id)
    }
}
