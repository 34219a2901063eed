//! Synthetic backend producing test patterns.
//!
//! Used by the test suites and headless demos; no display server or audio
//! device is touched. The backend also counts which constructors ran so
//! strategy-selection tests can observe the policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use bytes::Bytes;

use sharecast_common::error::{SharecastError, SharecastResult};

use crate::audio::{AudioChunk, AudioSource};
use crate::backend::CaptureBackend;
use crate::capturer::{Capturer, CapturerKind};
use crate::cursor::{CursorInfo, CursorProbe};
use crate::frame::Frame;

const PATTERN_WIDTH: u32 = 64;
const PATTERN_HEIGHT: u32 = 36;

/// Capturer producing a moving gradient pattern.
pub struct SyntheticCapturer {
    kind: CapturerKind,
    epoch: Instant,
    frame_index: u64,
}

impl SyntheticCapturer {
    fn new(kind: CapturerKind) -> Self {
        Self {
            kind,
            epoch: Instant::now(),
            frame_index: 0,
        }
    }
}

impl Capturer for SyntheticCapturer {
    fn capture_frame(&mut self) -> SharecastResult<Frame> {
        let mut data = Vec::with_capacity((PATTERN_WIDTH * PATTERN_HEIGHT * 4) as usize);
        let shift = (self.frame_index % 256) as u8;
        for y in 0..PATTERN_HEIGHT {
            for x in 0..PATTERN_WIDTH {
                data.push((x * 4) as u8 ^ shift);
                data.push((y * 7) as u8);
                data.push(shift);
                data.push(255);
            }
        }
        self.frame_index += 1;
        Ok(Frame {
            width: PATTERN_WIDTH,
            height: PATTERN_HEIGHT,
            data: Bytes::from(data),
            timestamp_ns: self.epoch.elapsed().as_nanos() as u64,
        })
    }

    fn kind(&self) -> CapturerKind {
        self.kind
    }

    fn name(&self) -> &str {
        match self.kind {
            CapturerKind::Accelerated => "synthetic-accelerated",
            CapturerKind::Fallback => "synthetic-fallback",
        }
    }
}

/// Probe that always reports the neutral cursor.
pub struct NeutralCursorProbe;

impl CursorProbe for NeutralCursorProbe {
    fn read_cursor(&mut self) -> SharecastResult<CursorInfo> {
        Ok(CursorInfo::default())
    }

    fn name(&self) -> &str {
        "neutral"
    }
}

/// Source that never produces audio.
pub struct SilenceSource;

impl AudioSource for SilenceSource {
    fn next_chunk(&mut self) -> SharecastResult<Option<AudioChunk>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "silence"
    }
}

/// Test-pattern backend with observable constructor counts.
pub struct SyntheticBackend {
    accelerated_available: bool,
    accelerated_built: AtomicUsize,
    fallback_built: AtomicUsize,
}

impl SyntheticBackend {
    /// Backend where the accelerated path initializes successfully.
    pub fn new() -> Self {
        Self {
            accelerated_available: true,
            accelerated_built: AtomicUsize::new(0),
            fallback_built: AtomicUsize::new(0),
        }
    }

    /// Backend where accelerated construction always fails, as on a host
    /// without the capture driver.
    pub fn without_accelerated() -> Self {
        Self {
            accelerated_available: false,
            ..Self::new()
        }
    }

    /// How many accelerated capturers were constructed.
    pub fn accelerated_built(&self) -> usize {
        self.accelerated_built.load(Ordering::SeqCst)
    }

    /// How many fallback capturers were constructed.
    pub fn fallback_built(&self) -> usize {
        self.fallback_built.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn new_accelerated_capturer(&self) -> SharecastResult<Box<dyn Capturer>> {
        if !self.accelerated_available {
            return Err(SharecastError::capture(
                "accelerated capture device unavailable",
            ));
        }
        self.accelerated_built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticCapturer::new(CapturerKind::Accelerated)))
    }

    fn new_fallback_capturer(&self) -> Box<dyn Capturer> {
        self.fallback_built.fetch_add(1, Ordering::SeqCst);
        Box::new(SyntheticCapturer::new(CapturerKind::Fallback))
    }

    fn new_cursor_probe(&self) -> Box<dyn CursorProbe> {
        Box::new(NeutralCursorProbe)
    }

    fn new_audio_source(&self) -> SharecastResult<Box<dyn AudioSource>> {
        Ok(Box::new(SilenceSource))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
