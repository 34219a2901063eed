//! Platform backend seam.
//!
//! Concrete capture technology (display duplication, GDI blitting, loopback
//! audio, cursor icon queries) is supplied by the embedding application
//! through this trait. The orchestration crates never touch a platform API
//! directly; they only consume the trait objects built here.

use sharecast_common::error::SharecastResult;

use crate::audio::AudioSource;
use crate::capturer::Capturer;
use crate::cursor::CursorProbe;

/// Factory for the platform's capture capabilities.
///
/// One backend per process. Every constructor hands out an independent
/// instance so per-viewer streams never share mutable capture state.
pub trait CaptureBackend: Send + Sync {
    /// Build a hardware-accelerated screen capturer.
    ///
    /// Construction is allowed to fail (missing driver, permission, device
    /// busy); callers treat failure as a signal to use the fallback path.
    fn new_accelerated_capturer(&self) -> SharecastResult<Box<dyn Capturer>>;

    /// Build the universally-available software screen capturer.
    fn new_fallback_capturer(&self) -> Box<dyn Capturer>;

    /// Build a cursor state probe for the watcher's poll loop.
    fn new_cursor_probe(&self) -> Box<dyn CursorProbe>;

    /// Open the system audio source. Failure leaves the session silent but
    /// otherwise intact.
    fn new_audio_source(&self) -> SharecastResult<Box<dyn AudioSource>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
