//! Capture strategy selection.
//!
//! Two capture strategies exist with distinct tradeoffs: a
//! hardware-accelerated path (lowest latency, picky about drivers and
//! exclusive device access) and a universally-compatible software path.
//! [`select_capturer`] owns the policy for choosing between them.

use sharecast_common::error::SharecastResult;

use crate::backend::CaptureBackend;
use crate::frame::Frame;

/// Which capture strategy a capturer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturerKind {
    /// Hardware-accelerated capture (display duplication or similar).
    Accelerated,
    /// Software capture, available everywhere.
    Fallback,
}

impl CapturerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapturerKind::Accelerated => "accelerated",
            CapturerKind::Fallback => "fallback",
        }
    }
}

/// A screen frame producer. One instance per viewer stream; the owning
/// frame loop drops it when the stream ends, releasing the underlying
/// capture resources.
pub trait Capturer: Send {
    /// Capture the next frame. Mid-stream failures are the caller's to
    /// handle; they do not invalidate other capturers.
    fn capture_frame(&mut self) -> SharecastResult<Frame>;

    /// Which strategy this capturer implements.
    fn kind(&self) -> CapturerKind;

    /// Capturer name for logging.
    fn name(&self) -> &str;
}

/// Pick a capture strategy for a newly approved viewer.
///
/// With no viewer connected yet, the accelerated path is worth attempting;
/// nothing depends on an existing capturer. Once a viewer is mid-stream,
/// new admissions get the software path so the accelerated pipeline is
/// never re-initialized under an active feed.
///
/// Accelerated construction failure is non-fatal: it is logged and the
/// software capturer is returned instead. No error escapes this function.
pub fn select_capturer(backend: &dyn CaptureBackend, current_viewer_count: usize) -> Box<dyn Capturer> {
    if current_viewer_count == 0 {
        match backend.new_accelerated_capturer() {
            Ok(capturer) => {
                tracing::debug!(capturer = %capturer.name(), "Accelerated capturer initialized");
                return capturer;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Accelerated capture unavailable, using fallback");
            }
        }
    }
    backend.new_fallback_capturer()
}
