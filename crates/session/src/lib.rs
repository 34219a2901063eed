//! Sharecast Session Core
//!
//! Orchestrates one sharing session: the signaling connection, viewer
//! admission and removal, per-viewer frame streaming, and cursor/audio
//! fan-out. The [`conductor::Conductor`] is the single entry point; the
//! embedding application constructs it once, passes it wherever it is
//! needed, and drains [`event::SessionEvent`]s to drive its UI.
//!
//! # Architecture
//!
//! ```text
//! relay ──SignalingEvent──▶ ┌────────────────────────────┐
//!                           │          Conductor          │
//! host UI ◀─SessionEvent──  │  ┌──────────┐ ┌──────────┐ │
//!          ──accept/deny─▶  │  │ Viewer   │ │ Capture  │ │
//!                           │  │ Registry │ │ Selector │ │
//!                           │  └──────────┘ └──────────┘ │
//!                           │   frame loops · fan-out     │
//!                           └────────────────────────────┘
//! ```

pub mod conductor;
pub mod event;
pub mod identity;
pub mod registry;
pub mod viewer;

pub use conductor::{Conductor, ConductorOptions, SessionState};
pub use event::SessionEvent;
pub use identity::{format_session_id, SessionInfo};
pub use registry::ViewerRegistry;
pub use viewer::{ViewerHandle, ViewerSummary};
