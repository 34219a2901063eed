//! The transport seam the conductor drives.

use tokio::sync::mpsc;

use sharecast_capture::{AudioChunk, CursorInfo, Frame};
use sharecast_common::error::SharecastResult;

use crate::types::SignalingEvent;

/// Outbound operations against the signaling relay plus the inbound event
/// stream. Implementations own their own socket state; all methods take
/// `&self` so the conductor can share the transport across tasks.
#[async_trait::async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Establish the relay connection and return the inbound event stream.
    ///
    /// On failure the transport holds no resources and the caller decides
    /// retry policy; the core never retries on its own.
    async fn connect(
        &self,
        host: &str,
    ) -> SharecastResult<mpsc::UnboundedReceiver<SignalingEvent>>;

    /// Announce this host to the relay.
    async fn send_device_info(
        &self,
        service_id: &str,
        machine_name: &str,
    ) -> SharecastResult<()>;

    /// Ask the relay to assign a session code. The code arrives later as
    /// [`SignalingEvent::SessionIdAssigned`].
    async fn request_session_id(&self) -> SharecastResult<()>;

    /// Tell the relay a viewer was removed so the remote UI reflects the
    /// teardown.
    async fn send_viewer_removed(&self, viewer_id: &str) -> SharecastResult<()>;

    /// Send a cursor change to the listed viewers.
    async fn send_cursor_change(
        &self,
        cursor: &CursorInfo,
        viewer_ids: &[String],
    ) -> SharecastResult<()>;

    /// Send one screen frame to a single viewer.
    async fn send_frame(&self, viewer_id: &str, frame: &Frame) -> SharecastResult<()>;

    /// Send one audio chunk to the listed viewers.
    async fn send_audio(&self, chunk: &AudioChunk, viewer_ids: &[String]) -> SharecastResult<()>;
}
