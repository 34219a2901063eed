//! Cursor icon watching.
//!
//! A single background poll loop per process tracks the system cursor and
//! publishes changes on a broadcast channel. Delivery is fire-and-forget:
//! a slow subscriber lags and drops, it never stalls the poll cadence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use sharecast_common::error::SharecastResult;

/// Default poll cadence for cursor change detection.
pub const DEFAULT_CURSOR_POLL_HZ: u32 = 20;

/// The current cursor shape and hotspot, broadcast to viewers on change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorInfo {
    /// Encoded cursor image identifying the shape. Empty for the neutral
    /// default cursor.
    pub image: Bytes,

    /// Hotspot offset within the image.
    pub hotspot_x: i32,
    pub hotspot_y: i32,

    /// CSS cursor keyword equivalent, for browser-based viewers.
    pub css_cursor: String,
}

impl Default for CursorInfo {
    fn default() -> Self {
        Self {
            image: Bytes::new(),
            hotspot_x: 0,
            hotspot_y: 0,
            css_cursor: "default".to_string(),
        }
    }
}

/// Platform seam for reading the current system cursor.
pub trait CursorProbe: Send {
    /// Read the current cursor state.
    fn read_cursor(&mut self) -> SharecastResult<CursorInfo>;

    /// Probe name for logging.
    fn name(&self) -> &str;
}

/// Shared watcher that polls a [`CursorProbe`] and emits change events.
///
/// `current()` always answers synchronously; before the first poll it
/// returns the neutral default cursor.
pub struct CursorIconWatcher {
    current: Arc<Mutex<CursorInfo>>,
    changes: broadcast::Sender<CursorInfo>,
    running: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    poll_hz: u32,
}

impl CursorIconWatcher {
    /// Create a watcher polling at the given rate. No task runs until
    /// [`spawn`](Self::spawn) is called.
    pub fn new(poll_hz: u32) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            current: Arc::new(Mutex::new(CursorInfo::default())),
            changes,
            running: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            poll_hz: poll_hz.max(1),
        }
    }

    /// Start the poll loop. Idempotent: a second call while the loop is
    /// running drops the redundant probe and changes nothing.
    pub fn spawn(&self, mut probe: Box<dyn CursorProbe>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("Cursor watcher already running");
            return;
        }
        self.stop_flag.store(false, Ordering::SeqCst);

        let current = self.current.clone();
        let changes = self.changes.clone();
        let running = self.running.clone();
        let stop_flag = self.stop_flag.clone();
        let interval = std::time::Duration::from_millis(1000 / self.poll_hz as u64);

        tokio::spawn(async move {
            tracing::info!(probe = %probe.name(), "Cursor watcher started");
            let mut last: Option<CursorInfo> = None;
            while !stop_flag.load(Ordering::Relaxed) {
                match probe.read_cursor() {
                    Ok(info) => {
                        if last.as_ref() != Some(&info) {
                            last = Some(info.clone());
                            *current.lock().unwrap() = info.clone();
                            // Fire-and-forget: no subscribers is fine, and a
                            // lagging subscriber drops old changes.
                            let _ = changes.send(info);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cursor probe failed");
                    }
                }
                tokio::time::sleep(interval).await;
            }
            running.store(false, Ordering::SeqCst);
            tracing::info!("Cursor watcher stopped");
        });
    }

    /// Latest known cursor; the neutral default before the first poll.
    pub fn current(&self) -> CursorInfo {
        self.current.lock().unwrap().clone()
    }

    /// Subscribe to cursor change events.
    pub fn subscribe(&self) -> broadcast::Receiver<CursorInfo> {
        self.changes.subscribe()
    }

    /// Request the poll loop to stop at its next tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Whether the poll loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
