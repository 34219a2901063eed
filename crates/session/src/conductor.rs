//! The session conductor.
//!
//! Owns the signaling connection and everything downstream of it: viewer
//! admission, capture strategy selection, per-viewer frame loops, and
//! cursor/audio fan-out. One conductor per process, constructed once and
//! handed to whoever needs it.
//!
//! Concurrency layout: the inbound signaling loop, the cursor fan-out
//! loop, the audio fan-out loop, and one frame loop per viewer all run as
//! independent tasks over a shared [`Inner`]. Shared mutable state is
//! confined to the viewer registry's mutex and the admission lock that
//! serializes capture-strategy decisions.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, watch, Mutex as AsyncMutex};

use sharecast_capture::{
    select_capturer, AudioCapturer, AudioChunk, CaptureBackend, Capturer, CursorIconWatcher,
    CursorInfo,
};
use sharecast_capture::cursor::DEFAULT_CURSOR_POLL_HZ;
use sharecast_common::clock::{RateController, SessionClock};
use sharecast_common::config::HostConfig;
use sharecast_common::error::{SharecastError, SharecastResult};
use sharecast_signaling::{CastRequest, SignalingEvent, SignalingTransport};

use crate::event::SessionEvent;
use crate::identity::{format_session_id, generate_service_id, SessionInfo};
use crate::registry::ViewerRegistry;
use crate::viewer::{ViewerHandle, ViewerSummary};

/// Connection state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No signaling connection. The only way out is [`Conductor::connect`].
    Disconnected,
    /// Signaling connection established; zero or more viewers streaming.
    Connected,
}

/// Tunables for a conductor.
#[derive(Debug, Clone)]
pub struct ConductorOptions {
    /// Display name reported to the relay.
    pub machine_name: String,

    /// Target frame rate per viewer stream.
    pub frame_rate_hz: u32,

    /// Cursor poll cadence.
    pub cursor_poll_hz: u32,
}

impl Default for ConductorOptions {
    fn default() -> Self {
        Self {
            machine_name: HostConfig::default().machine_name,
            frame_rate_hz: 30,
            cursor_poll_hz: DEFAULT_CURSOR_POLL_HZ,
        }
    }
}

/// The session orchestrator.
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct Conductor {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn SignalingTransport>,
    backend: Arc<dyn CaptureBackend>,
    registry: ViewerRegistry,
    cursor_watcher: CursorIconWatcher,
    audio: AudioCapturer,
    service_id: String,
    session: Mutex<Option<SessionInfo>>,
    clock: Mutex<Option<SessionClock>>,
    connected: watch::Sender<bool>,
    events: mpsc::UnboundedSender<SessionEvent>,
    // Serializes capturer selection + registration so two concurrent
    // admissions cannot both observe an empty registry.
    admission: AsyncMutex<()>,
    options: ConductorOptions,
}

impl Conductor {
    /// Build a conductor over the given transport and capture backend.
    /// Returns the conductor and the UI event stream.
    pub fn new(
        transport: Arc<dyn SignalingTransport>,
        backend: Arc<dyn CaptureBackend>,
        options: ConductorOptions,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (connected, _) = watch::channel(false);
        let cursor_watcher = CursorIconWatcher::new(options.cursor_poll_hz);
        let conductor = Self {
            inner: Arc::new(Inner {
                transport,
                backend,
                registry: ViewerRegistry::new(),
                cursor_watcher,
                audio: AudioCapturer::new(),
                service_id: generate_service_id(),
                session: Mutex::new(None),
                clock: Mutex::new(None),
                connected,
                events,
                admission: AsyncMutex::new(()),
                options,
            }),
        };
        (conductor, events_rx)
    }

    /// Establish the signaling connection and start the session's
    /// background loops.
    ///
    /// On failure the session stays [`SessionState::Disconnected`]; retry
    /// policy belongs to the caller.
    pub async fn connect(&self, host: &str) -> SharecastResult<()> {
        let inner = &self.inner;
        if *inner.connected.borrow() {
            return Err(SharecastError::connection("already connected"));
        }

        let events = inner.transport.connect(host).await?;
        inner
            .transport
            .send_device_info(&inner.service_id, &inner.options.machine_name)
            .await?;
        inner.transport.request_session_id().await?;

        *inner.session.lock().unwrap() = Some(SessionInfo::new(host));
        *inner.clock.lock().unwrap() = Some(SessionClock::start());
        inner.connected.send_replace(true);
        inner
            .cursor_watcher
            .spawn(inner.backend.new_cursor_probe());

        tokio::spawn(run_inbound(inner.clone(), events));
        tokio::spawn(run_cursor_fanout(
            inner.clone(),
            inner.cursor_watcher.subscribe(),
        ));
        tokio::spawn(run_audio_fanout(inner.clone(), inner.audio.subscribe()));

        tracing::info!(host, service_id = %inner.service_id, "Session connected");
        Ok(())
    }

    /// Admit a viewer whose cast request was approved.
    ///
    /// Sends the current cursor to the requesting viewer before any frame,
    /// selects a capture strategy against the pre-admission viewer count,
    /// registers the viewer, starts its frame loop, and makes sure the
    /// shared audio capturer is running.
    pub async fn accept_cast_request(&self, request: CastRequest) -> SharecastResult<()> {
        let inner = &self.inner;
        let _admission = inner.admission.lock().await;
        if !*inner.connected.borrow() {
            return Err(SharecastError::connection("not connected to relay"));
        }

        let cursor = inner.cursor_watcher.current();
        inner
            .transport
            .send_cursor_change(&cursor, std::slice::from_ref(&request.viewer_id))
            .await?;

        let capturer = select_capturer(inner.backend.as_ref(), inner.registry.len());
        let viewer = ViewerHandle::new(request.viewer_id.clone(), request.requester_name.clone());
        inner.registry.add(viewer.clone())?;

        tracing::info!(
            viewer = %request.viewer_id,
            requester = %request.requester_name,
            capturer = %capturer.name(),
            "Viewer admitted"
        );
        inner.emit(SessionEvent::ViewerAdded(viewer.summary()));

        tokio::spawn(run_frame_stream(inner.clone(), viewer, capturer));

        if !inner.audio.is_running() {
            match inner.backend.new_audio_source() {
                Ok(source) => inner.audio.start(source),
                Err(e) => {
                    tracing::warn!(error = %e, "Audio source unavailable, continuing without audio");
                }
            }
        }
        Ok(())
    }

    /// Decline a cast request. No state changes, nothing is allocated.
    pub fn deny_cast_request(&self, request: CastRequest) {
        tracing::info!(
            viewer = %request.viewer_id,
            requester = %request.requester_name,
            "Cast request denied"
        );
    }

    /// Remove the listed viewers: mark each as disconnecting, notify the
    /// relay once per viewer, and release their stream resources. Racing
    /// against a concurrently-arriving remote hangup is safe; the loser of
    /// the race is a no-op.
    pub async fn remove_viewers<I, S>(&self, viewer_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in viewer_ids {
            self.inner.remove_viewer(id.as_ref(), true).await;
        }
    }

    /// Toggle audio delivery for one viewer. Returns `false` for unknown ids.
    pub fn set_viewer_audio(&self, viewer_id: &str, enabled: bool) -> bool {
        match self.inner.registry.get(viewer_id) {
            Some(viewer) => {
                viewer.set_audio_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        if *self.inner.connected.borrow() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Snapshot of the active session identity, if connected.
    pub fn session(&self) -> Option<SessionInfo> {
        self.inner.session.lock().unwrap().clone()
    }

    /// Display-formatted session code, if one has been assigned.
    pub fn formatted_session_id(&self) -> Option<String> {
        let guard = self.inner.session.lock().unwrap();
        guard
            .as_ref()
            .filter(|s| !s.session_id.is_empty())
            .map(|s| s.formatted_session_id())
    }

    /// Stable identifier for this host installation.
    pub fn service_id(&self) -> &str {
        &self.inner.service_id
    }

    /// Connected viewers in admission order.
    pub fn viewers(&self) -> Vec<ViewerSummary> {
        self.inner.registry.summaries()
    }
}

impl Inner {
    fn emit(&self, event: SessionEvent) {
        // Fire-and-forget; a vanished UI consumer is not our problem.
        let _ = self.events.send(event);
    }

    fn apply_session_id(&self, raw: String) {
        let formatted = format_session_id(&raw);
        if let Some(session) = self.session.lock().unwrap().as_mut() {
            session.assign_session_id(raw);
        }
        tracing::info!(session_id = %formatted, "Session code assigned");
        self.emit(SessionEvent::SessionIdChanged(formatted));
    }

    /// Single removal path for every origin (local kick, remote hangup,
    /// stream failure). The `begin_disconnect` winner sends the one relay
    /// notification; everyone else is a no-op.
    async fn remove_viewer(self: &Arc<Self>, viewer_id: &str, notify_relay: bool) -> bool {
        let Some(_viewer) = self.registry.begin_disconnect(viewer_id) else {
            return false;
        };
        if notify_relay && *self.connected.borrow() {
            if let Err(e) = self.transport.send_viewer_removed(viewer_id).await {
                tracing::warn!(
                    viewer = %viewer_id,
                    error = %e,
                    "Failed to notify relay of viewer removal"
                );
            }
        }
        self.registry.remove(viewer_id);
        self.emit(SessionEvent::ViewerRemoved {
            viewer_id: viewer_id.to_string(),
        });
        tracing::info!(viewer = %viewer_id, "Viewer removed");
        true
    }

    /// Relay loss is fatal to the session: every viewer is force-removed
    /// locally (the relay is unreachable, so nothing is sent to it), the
    /// shared capture loops stop, and the state reverts to Disconnected.
    async fn handle_connection_lost(self: &Arc<Self>) {
        let was_connected = self.connected.send_replace(false);
        if !was_connected {
            return;
        }
        let uptime_secs = self
            .clock
            .lock()
            .unwrap()
            .take()
            .map(|c| c.elapsed_secs())
            .unwrap_or(0.0);
        tracing::warn!(uptime_secs, "Signaling connection lost, tearing down session");

        for viewer in self.registry.drain() {
            viewer.request_disconnect();
            self.emit(SessionEvent::ViewerRemoved {
                viewer_id: viewer.connection_id().to_string(),
            });
        }
        self.cursor_watcher.stop();
        self.audio.stop().await;
        *self.session.lock().unwrap() = None;
        self.emit(SessionEvent::Disconnected);
    }
}

/// Drain inbound signaling events until the connection dies.
async fn run_inbound(inner: Arc<Inner>, mut events: mpsc::UnboundedReceiver<SignalingEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SignalingEvent::SessionIdAssigned(raw) => inner.apply_session_id(raw),
            SignalingEvent::CastRequested(request) => {
                tracing::info!(
                    viewer = %request.viewer_id,
                    requester = %request.requester_name,
                    "Cast requested"
                );
                inner.emit(SessionEvent::CastRequested(request));
            }
            SignalingEvent::ViewerDisconnected { viewer_id } => {
                inner.remove_viewer(&viewer_id, true).await;
            }
            SignalingEvent::ConnectionLost => {
                inner.handle_connection_lost().await;
                return;
            }
        }
    }
    // The transport dropped its event stream without an explicit loss
    // notification; treat it the same way.
    inner.handle_connection_lost().await;
}

/// Stream frames to one viewer until it disconnects or its stream fails.
/// Failure here is isolated: it removes this viewer and nothing else.
async fn run_frame_stream(inner: Arc<Inner>, viewer: ViewerHandle, mut capturer: Box<dyn Capturer>) {
    let pace = RateController::new(inner.options.frame_rate_hz).interval();
    tracing::info!(
        viewer = %viewer.connection_id(),
        capturer = %capturer.name(),
        "Frame stream started"
    );

    loop {
        if viewer.disconnect_requested() || !*inner.connected.borrow() {
            break;
        }
        match capturer.capture_frame() {
            Ok(frame) => match inner.transport.send_frame(viewer.connection_id(), &frame).await {
                Ok(()) => viewer.record_frame(),
                Err(e) => {
                    tracing::warn!(
                        viewer = %viewer.connection_id(),
                        error = %e,
                        "Frame send failed, removing viewer"
                    );
                    inner.remove_viewer(viewer.connection_id(), true).await;
                    break;
                }
            },
            Err(e) => {
                tracing::warn!(
                    viewer = %viewer.connection_id(),
                    error = %e,
                    "Capture failed, removing viewer"
                );
                inner.remove_viewer(viewer.connection_id(), true).await;
                break;
            }
        }
        tokio::time::sleep(pace).await;
    }

    tracing::debug!(
        viewer = %viewer.connection_id(),
        frames = viewer.frames_sent(),
        "Frame stream ended"
    );
    // The capturer drops here, releasing its capture resources.
}

/// Forward cursor changes to every registered viewer.
async fn run_cursor_fanout(inner: Arc<Inner>, mut changes: broadcast::Receiver<CursorInfo>) {
    let mut connected = inner.connected.subscribe();
    loop {
        tokio::select! {
            result = changes.recv() => match result {
                Ok(cursor) => {
                    let ids = inner.registry.connection_ids();
                    if ids.is_empty() {
                        continue;
                    }
                    if let Err(e) = inner.transport.send_cursor_change(&cursor, &ids).await {
                        tracing::warn!(error = %e, "Cursor fan-out send failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cursor fan-out lagged, dropping stale changes");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = connected.changed() => {
                if !*connected.borrow() {
                    break;
                }
            }
        }
    }
}

/// Forward audio chunks to viewers that opted into audio.
async fn run_audio_fanout(inner: Arc<Inner>, mut chunks: broadcast::Receiver<AudioChunk>) {
    let mut connected = inner.connected.subscribe();
    loop {
        tokio::select! {
            result = chunks.recv() => match result {
                Ok(chunk) => {
                    let ids = inner.registry.audio_viewer_ids();
                    if ids.is_empty() {
                        continue;
                    }
                    if let Err(e) = inner.transport.send_audio(&chunk, &ids).await {
                        tracing::warn!(error = %e, "Audio fan-out send failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Audio fan-out lagged, dropping stale chunks");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = connected.changed() => {
                if !*connected.borrow() {
                    break;
                }
            }
        }
    }
}
