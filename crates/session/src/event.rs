//! Events the conductor publishes to the host UI.

use sharecast_signaling::CastRequest;

use crate::viewer::ViewerSummary;

/// UI-facing session events, delivered over an unbounded channel so a slow
/// consumer never blocks the producers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The display-formatted session code changed.
    SessionIdChanged(String),

    /// A remote party asks to share; answer with
    /// [`accept_cast_request`](crate::conductor::Conductor::accept_cast_request)
    /// or [`deny_cast_request`](crate::conductor::Conductor::deny_cast_request).
    CastRequested(CastRequest),

    /// A viewer was admitted.
    ViewerAdded(ViewerSummary),

    /// A viewer is gone (local kick, remote hangup, or stream failure).
    ViewerRemoved { viewer_id: String },

    /// The signaling connection is gone and the session has been torn
    /// down. Reconnecting is the embedder's decision.
    Disconnected,
}
