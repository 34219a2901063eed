//! Signaling boundary types.

use serde::{Deserialize, Serialize};

/// An inbound request from a remote party to view this host's screen.
///
/// Ephemeral: carried to the approval flow and consumed there. Denial
/// drops it without any state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastRequest {
    /// Relay-assigned connection id for the prospective viewer.
    pub viewer_id: String,

    /// Display name the remote party supplied.
    pub requester_name: String,
}

/// Events the relay pushes to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// The relay assigned (or reassigned) this host's session code.
    SessionIdAssigned(String),

    /// A remote party asks to view the screen. Approval is external.
    CastRequested(CastRequest),

    /// A viewer hung up or was dropped by the relay.
    ViewerDisconnected { viewer_id: String },

    /// The signaling connection is gone. Fatal to the session; the host
    /// must reconnect from scratch.
    ConnectionLost,
}
