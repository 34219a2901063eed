//! Sharecast Common Utilities
//!
//! Shared infrastructure for all Sharecast crates:
//! - Error types and result aliases
//! - Timing utilities for stream pacing
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
