//! Per-viewer state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Shared state for one connected viewer.
///
/// Handles are cheap clones over one allocation: the registry holds one,
/// the viewer's frame loop holds another. The disconnect flag is therefore
/// visible to an in-flight stream even after the registry entry is gone,
/// which is what lets removal race safely against sends.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    shared: Arc<ViewerShared>,
}

#[derive(Debug)]
struct ViewerShared {
    connection_id: String,
    requester_name: String,
    disconnect_requested: AtomicBool,
    audio_enabled: AtomicBool,
    frames_sent: AtomicU64,
}

impl ViewerHandle {
    pub fn new(connection_id: impl Into<String>, requester_name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(ViewerShared {
                connection_id: connection_id.into(),
                requester_name: requester_name.into(),
                disconnect_requested: AtomicBool::new(false),
                audio_enabled: AtomicBool::new(false),
                frames_sent: AtomicU64::new(0),
            }),
        }
    }

    /// Relay-assigned connection id, unique among live viewers.
    pub fn connection_id(&self) -> &str {
        &self.shared.connection_id
    }

    /// Display name the remote party supplied.
    pub fn requester_name(&self) -> &str {
        &self.shared.requester_name
    }

    /// Whether removal of this viewer is in flight.
    pub fn disconnect_requested(&self) -> bool {
        self.shared.disconnect_requested.load(Ordering::SeqCst)
    }

    /// Mark this viewer as going away. Returns `true` only for the call
    /// that actually initiated the disconnect.
    pub(crate) fn request_disconnect(&self) -> bool {
        !self
            .shared
            .disconnect_requested
            .swap(true, Ordering::SeqCst)
    }

    /// Whether this viewer receives audio.
    pub fn audio_enabled(&self) -> bool {
        self.shared.audio_enabled.load(Ordering::SeqCst)
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        self.shared.audio_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Frames sent to this viewer so far.
    pub fn frames_sent(&self) -> u64 {
        self.shared.frames_sent.load(Ordering::Relaxed)
    }

    pub(crate) fn record_frame(&self) {
        self.shared.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Immutable snapshot for UI consumption.
    pub fn summary(&self) -> ViewerSummary {
        ViewerSummary {
            connection_id: self.shared.connection_id.clone(),
            requester_name: self.shared.requester_name.clone(),
        }
    }
}

/// What the host UI shows per viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerSummary {
    pub connection_id: String,
    pub requester_name: String,
}
