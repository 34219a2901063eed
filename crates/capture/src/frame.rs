//! Screen frame value type.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One captured screen image, ready for transmission to a viewer.
///
/// The pixel payload is opaque to the orchestration layer; encoding is the
/// transport's concern. `Bytes` keeps clones cheap when the same frame is
/// inspected by bookkeeping and transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Encoded pixel payload.
    pub data: Bytes,

    /// Monotonic nanoseconds since the capturer was created.
    #[serde(rename = "t")]
    pub timestamp_ns: u64,
}

impl Frame {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no pixel data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
