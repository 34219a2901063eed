//! Relay wire messages.
//!
//! JSON frames, internally tagged. Only the framing is defined here; what
//! the relay does with each message is its own business.

use serde::{Deserialize, Serialize};

use sharecast_capture::{AudioChunk, CursorInfo, Frame};

use crate::types::CastRequest;

/// Messages the host sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identify this host installation.
    DeviceInfo {
        service_id: String,
        machine_name: String,
    },

    /// Request a session code assignment.
    GetSessionId,

    /// A viewer was removed on the host side.
    ViewerRemoved { viewer_id: String },

    /// Cursor shape changed; deliver to these viewers.
    CursorChange {
        cursor: CursorInfo,
        viewer_ids: Vec<String>,
    },

    /// One screen frame for one viewer.
    Frame { viewer_id: String, frame: Frame },

    /// One audio chunk for these viewers.
    Audio {
        chunk: AudioChunk,
        viewer_ids: Vec<String>,
    },
}

/// Messages the relay sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session code assignment (initial or reassignment).
    SessionId { session_id: String },

    /// A remote party requests to view the screen.
    CastRequest(CastRequest),

    /// A viewer disconnected on the remote side.
    ViewerDisconnected { viewer_id: String },
}
