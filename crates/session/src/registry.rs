//! The authoritative set of connected viewers.
//!
//! All mutation happens under one mutex so no caller ever observes a
//! partially-applied add or remove, regardless of which task or thread it
//! runs on. Insertion order is preserved for deterministic UI listings.

use std::sync::Mutex;

use sharecast_common::error::{SharecastError, SharecastResult};

use crate::viewer::{ViewerHandle, ViewerSummary};

/// Thread-safe, insertion-ordered viewer registry.
#[derive(Debug, Default)]
pub struct ViewerRegistry {
    inner: Mutex<Vec<ViewerHandle>>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer.
    ///
    /// A duplicate `connection_id` replaces the prior entry only when that
    /// entry is already on its way out (`disconnect_requested`). A live
    /// duplicate is a protocol violation and is reported, never silently
    /// overwritten.
    pub fn add(&self, viewer: ViewerHandle) -> SharecastResult<()> {
        let mut entries = self.inner.lock().unwrap();
        if let Some(existing) = entries
            .iter_mut()
            .find(|v| v.connection_id() == viewer.connection_id())
        {
            if existing.disconnect_requested() {
                tracing::debug!(
                    viewer = %viewer.connection_id(),
                    "Replacing disconnecting registry entry"
                );
                *existing = viewer;
                return Ok(());
            }
            return Err(SharecastError::registry(format!(
                "duplicate live viewer id {:?}",
                viewer.connection_id()
            )));
        }
        entries.push(viewer);
        Ok(())
    }

    /// Atomically mark a viewer as disconnecting. Returns the handle only
    /// for the caller that initiated the disconnect; later callers (and
    /// unknown ids) get `None`. This gates the single relay notification.
    pub fn begin_disconnect(&self, connection_id: &str) -> Option<ViewerHandle> {
        let entries = self.inner.lock().unwrap();
        let viewer = entries
            .iter()
            .find(|v| v.connection_id() == connection_id)?;
        if viewer.request_disconnect() {
            Some(viewer.clone())
        } else {
            None
        }
    }

    /// Drop a viewer from the registry. Unknown ids are a no-op.
    pub fn remove(&self, connection_id: &str) -> Option<ViewerHandle> {
        let mut entries = self.inner.lock().unwrap();
        let index = entries
            .iter()
            .position(|v| v.connection_id() == connection_id)?;
        Some(entries.remove(index))
    }

    /// Look up a viewer by connection id.
    pub fn get(&self, connection_id: &str) -> Option<ViewerHandle> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.connection_id() == connection_id)
            .cloned()
    }

    /// All viewers in insertion order.
    pub fn list(&self) -> Vec<ViewerHandle> {
        self.inner.lock().unwrap().clone()
    }

    /// UI snapshots in insertion order.
    pub fn summaries(&self) -> Vec<ViewerSummary> {
        self.inner.lock().unwrap().iter().map(|v| v.summary()).collect()
    }

    /// Connection ids of all live viewers, for fan-out.
    pub fn connection_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|v| !v.disconnect_requested())
            .map(|v| v.connection_id().to_string())
            .collect()
    }

    /// Connection ids of viewers that opted into audio.
    pub fn audio_viewer_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.audio_enabled() && !v.disconnect_requested())
            .map(|v| v.connection_id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Take every entry out of the registry (connection-loss teardown).
    pub fn drain(&self) -> Vec<ViewerHandle> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }
}
