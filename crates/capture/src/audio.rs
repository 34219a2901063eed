//! Shared audio capture.
//!
//! One audio stream per process, started on demand when the first viewer
//! is admitted. Chunks are published on a broadcast channel; the conductor
//! forwards them to viewers that opted into audio.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use sharecast_common::error::SharecastResult;

/// One block of captured PCM audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Raw PCM payload.
    pub pcm: Bytes,

    /// Samples per second.
    pub sample_rate: u32,

    /// Channel count.
    pub channels: u16,
}

/// Platform seam for the underlying audio device.
///
/// The source is owned by the capture task and dropped when the task
/// stops, releasing the device.
pub trait AudioSource: Send {
    /// Pull the next chunk. `Ok(None)` means no audio is available right
    /// now; the capture loop yields and retries.
    fn next_chunk(&mut self) -> SharecastResult<Option<AudioChunk>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Process-wide audio capturer with an idempotent start.
pub struct AudioCapturer {
    chunks: broadcast::Sender<AudioChunk>,
    running: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AudioCapturer {
    pub fn new() -> Self {
        let (chunks, _) = broadcast::channel(64);
        Self {
            chunks,
            running: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Start capturing from `source`. Idempotent: if a stream is already
    /// active the redundant source is dropped and nothing changes.
    pub fn start(&self, mut source: Box<dyn AudioSource>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("Audio capturer already running");
            return;
        }
        self.stop_flag.store(false, Ordering::SeqCst);

        let chunks = self.chunks.clone();
        let running = self.running.clone();
        let stop_flag = self.stop_flag.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(source = %source.name(), "Audio capture started");
            while !stop_flag.load(Ordering::Relaxed) {
                match source.next_chunk() {
                    Ok(Some(chunk)) => {
                        let _ = chunks.send(chunk);
                    }
                    Ok(None) => {
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Audio source error");
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    }
                }
            }
            // Dropping the source here releases the audio device.
            drop(source);
            running.store(false, Ordering::SeqCst);
            tracing::info!("Audio capture stopped");
        });

        *self.task.lock().unwrap() = Some(handle);
    }

    /// Stop the capture stream and wait for the device to be released.
    pub async fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Subscribe to captured chunks.
    pub fn subscribe(&self) -> broadcast::Receiver<AudioChunk> {
        self.chunks.subscribe()
    }

    /// Whether a capture stream is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for AudioCapturer {
    fn default() -> Self {
        Self::new()
    }
}
