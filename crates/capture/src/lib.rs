//! Sharecast Capture
//!
//! Screen, cursor, and audio producers for the sharing host. The concrete
//! platform backends (display duplication, GDI-style blitting, loopback
//! audio devices) live behind the [`backend::CaptureBackend`] seam; this
//! crate owns the strategy selection policy, the cursor change watcher, and
//! the shared audio capturer that the session conductor fans out from.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Conductor (session)             │
//! │  ┌───────────┐ ┌─────────────┐ ┌───────────┐ │
//! │  │ Capturer  │ │ CursorIcon  │ │  Audio    │ │
//! │  │ (per      │ │ Watcher     │ │  Capturer │ │
//! │  │  viewer)  │ │ (shared)    │ │  (shared) │ │
//! │  └─────┬─────┘ └──────┬──────┘ └─────┬─────┘ │
//! │        ▼              ▼              ▼        │
//! │  ┌──────────────────────────────────────────┐ │
//! │  │     CaptureBackend (platform seam)       │ │
//! │  └──────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod backend;
pub mod capturer;
pub mod cursor;
pub mod frame;
pub mod synthetic;

pub use audio::{AudioCapturer, AudioChunk, AudioSource};
pub use backend::CaptureBackend;
pub use capturer::{select_capturer, Capturer, CapturerKind};
pub use cursor::{CursorIconWatcher, CursorInfo, CursorProbe};
pub use frame::Frame;
pub use synthetic::SyntheticBackend;
