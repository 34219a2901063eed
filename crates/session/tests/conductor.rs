//! End-to-end conductor scenarios against an in-memory relay transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use sharecast_capture::{AudioChunk, CursorInfo, Frame, SyntheticBackend};
use sharecast_common::error::{SharecastError, SharecastResult};
use sharecast_session::{Conductor, ConductorOptions, SessionEvent, SessionState};
use sharecast_signaling::{CastRequest, SignalingEvent, SignalingTransport};

/// Everything the host pushed toward the relay, in order.
#[derive(Debug, Clone, PartialEq)]
enum Sent {
    DeviceInfo {
        machine_name: String,
    },
    GetSessionId,
    ViewerRemoved(String),
    CursorChange(Vec<String>),
    Frame(String),
    Audio(Vec<String>),
}

#[derive(Default)]
struct MockTransport {
    fail_connect: bool,
    sent: Mutex<Vec<Sent>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<SignalingEvent>>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            fail_connect: true,
            ..Self::default()
        })
    }

    fn push(&self, msg: Sent) {
        self.sent.lock().unwrap().push(msg);
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Inject an inbound relay event.
    fn emit(&self, event: SignalingEvent) {
        self.inbound
            .lock()
            .unwrap()
            .as_ref()
            .expect("transport not connected")
            .send(event)
            .expect("inbound loop gone");
    }

    fn viewer_removed_count(&self, viewer_id: &str) -> usize {
        self.sent()
            .iter()
            .filter(|msg| matches!(msg, Sent::ViewerRemoved(id) if id == viewer_id))
            .count()
    }
}

#[async_trait]
impl SignalingTransport for MockTransport {
    async fn connect(
        &self,
        _host: &str,
    ) -> SharecastResult<mpsc::UnboundedReceiver<SignalingEvent>> {
        if self.fail_connect {
            return Err(SharecastError::connection("relay unreachable"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inbound.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn send_device_info(
        &self,
        _service_id: &str,
        machine_name: &str,
    ) -> SharecastResult<()> {
        self.push(Sent::DeviceInfo {
            machine_name: machine_name.to_string(),
        });
        Ok(())
    }

    async fn request_session_id(&self) -> SharecastResult<()> {
        self.push(Sent::GetSessionId);
        Ok(())
    }

    async fn send_viewer_removed(&self, viewer_id: &str) -> SharecastResult<()> {
        self.push(Sent::ViewerRemoved(viewer_id.to_string()));
        Ok(())
    }

    async fn send_cursor_change(
        &self,
        _cursor: &CursorInfo,
        viewer_ids: &[String],
    ) -> SharecastResult<()> {
        self.push(Sent::CursorChange(viewer_ids.to_vec()));
        Ok(())
    }

    async fn send_frame(&self, viewer_id: &str, _frame: &Frame) -> SharecastResult<()> {
        self.push(Sent::Frame(viewer_id.to_string()));
        Ok(())
    }

    async fn send_audio(&self, _chunk: &AudioChunk, viewer_ids: &[String]) -> SharecastResult<()> {
        self.push(Sent::Audio(viewer_ids.to_vec()));
        Ok(())
    }
}

fn test_conductor(
    transport: Arc<MockTransport>,
    backend: Arc<SyntheticBackend>,
) -> (Conductor, mpsc::UnboundedReceiver<SessionEvent>) {
    Conductor::new(
        transport,
        backend,
        ConductorOptions {
            machine_name: "test-host".to_string(),
            frame_rate_hz: 120,
            cursor_poll_hz: 50,
        },
    )
}

fn cast_request(viewer_id: &str, requester_name: &str) -> CastRequest {
    CastRequest {
        viewer_id: viewer_id.to_string(),
        requester_name: requester_name.to_string(),
    }
}

/// Drain events until one matches, with a hard timeout.
async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    mut pred: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn connect_failure_leaves_session_disconnected() {
    let transport = MockTransport::unreachable();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend);

    let err = conductor.connect("wss://relay.test").await.unwrap_err();
    assert!(matches!(err, SharecastError::Connection { .. }));
    assert_eq!(conductor.state(), SessionState::Disconnected);
    assert!(conductor.session().is_none());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn connect_announces_host_and_requests_session_code() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    assert_eq!(conductor.state(), SessionState::Connected);

    let sent = transport.sent();
    assert_eq!(
        sent[0],
        Sent::DeviceInfo {
            machine_name: "test-host".to_string()
        }
    );
    assert_eq!(sent[1], Sent::GetSessionId);
}

#[tokio::test]
async fn relay_assigned_code_is_formatted_in_triplets() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, mut events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    transport.emit(SignalingEvent::SessionIdAssigned("ABCDEFGHI".to_string()));

    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::SessionIdChanged(_))
    })
    .await;
    assert_eq!(
        event,
        SessionEvent::SessionIdChanged("ABC DEF GHI".to_string())
    );
    assert_eq!(
        conductor.formatted_session_id(),
        Some("ABC DEF GHI".to_string())
    );
}

#[tokio::test]
async fn cast_requests_surface_to_the_embedder() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, mut events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    transport.emit(SignalingEvent::CastRequested(cast_request("v1", "Alice")));

    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CastRequested(_))
    })
    .await;
    assert_eq!(
        event,
        SessionEvent::CastRequested(cast_request("v1", "Alice"))
    );
    // Nothing is allocated until the embedder approves.
    assert!(conductor.viewers().is_empty());
}

#[tokio::test]
async fn first_viewer_gets_accelerated_capture_and_initial_cursor() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, mut events) = test_conductor(transport.clone(), backend.clone());

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();

    assert_eq!(backend.accelerated_built(), 1);
    assert_eq!(backend.fallback_built(), 0);

    wait_for(&mut events, |e| matches!(e, SessionEvent::ViewerAdded(_))).await;
    let viewers = conductor.viewers();
    assert_eq!(viewers.len(), 1);
    assert_eq!(viewers[0].connection_id, "v1");
    assert_eq!(viewers[0].requester_name, "Alice");

    // The requester sees the current cursor before its first frame.
    let t = transport.clone();
    wait_until(move || {
        t.sent()
            .iter()
            .any(|msg| matches!(msg, Sent::Frame(id) if id == "v1"))
    })
    .await;
    let sent = transport.sent();
    let cursor_pos = sent
        .iter()
        .position(|msg| matches!(msg, Sent::CursorChange(ids) if ids == &["v1".to_string()]))
        .expect("initial cursor not sent");
    let frame_pos = sent
        .iter()
        .position(|msg| matches!(msg, Sent::Frame(id) if id == "v1"))
        .expect("no frame streamed");
    assert!(cursor_pos < frame_pos, "cursor must precede the first frame");
}

#[tokio::test]
async fn accelerated_failure_degrades_to_fallback_capture() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::without_accelerated());
    let (conductor, _events) = test_conductor(transport.clone(), backend.clone());

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();

    assert_eq!(backend.accelerated_built(), 0);
    assert_eq!(backend.fallback_built(), 1);
    assert_eq!(conductor.viewers().len(), 1);
}

#[tokio::test]
async fn second_viewer_streams_with_fallback_capture() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend.clone());

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();
    conductor
        .accept_cast_request(cast_request("v2", "Bob"))
        .await
        .unwrap();

    // v1's accelerated capturer is untouched; v2 got the software path.
    assert_eq!(backend.accelerated_built(), 1);
    assert_eq!(backend.fallback_built(), 1);

    let ids: Vec<_> = conductor
        .viewers()
        .into_iter()
        .map(|v| v.connection_id)
        .collect();
    assert_eq!(ids, vec!["v1".to_string(), "v2".to_string()]);
}

#[tokio::test]
async fn duplicate_live_viewer_id_is_a_protocol_violation() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();

    let err = conductor
        .accept_cast_request(cast_request("v1", "Mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, SharecastError::Registry { .. }));
    assert_eq!(conductor.viewers().len(), 1);
    assert_eq!(conductor.viewers()[0].requester_name, "Alice");
}

#[tokio::test]
async fn denial_changes_nothing() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend.clone());

    conductor.connect("wss://relay.test").await.unwrap();
    conductor.deny_cast_request(cast_request("v1", "Alice"));

    assert!(conductor.viewers().is_empty());
    assert_eq!(backend.accelerated_built(), 0);
    assert_eq!(backend.fallback_built(), 0);
    assert!(!transport
        .sent()
        .iter()
        .any(|msg| matches!(msg, Sent::CursorChange(_) | Sent::Frame(_))));
}

#[tokio::test]
async fn double_removal_notifies_relay_exactly_once() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, mut events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();

    // Local kick and remote hangup race for the same viewer.
    conductor.remove_viewers(["v1"]).await;
    transport.emit(SignalingEvent::ViewerDisconnected {
        viewer_id: "v1".to_string(),
    });

    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::ViewerRemoved { viewer_id } if viewer_id == "v1")
    })
    .await;
    let c = conductor.clone();
    wait_until(move || c.viewers().is_empty()).await;
    // Give the inbound loop time to process the redundant hangup.
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(transport.viewer_removed_count("v1"), 1);
}

#[tokio::test]
async fn relay_loss_tears_down_every_viewer_without_notification() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, mut events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();
    conductor
        .accept_cast_request(cast_request("v2", "Bob"))
        .await
        .unwrap();

    transport.emit(SignalingEvent::ConnectionLost);

    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::ViewerRemoved { viewer_id } if viewer_id == "v1")
    })
    .await;
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::ViewerRemoved { viewer_id } if viewer_id == "v2")
    })
    .await;
    wait_for(&mut events, |e| matches!(e, SessionEvent::Disconnected)).await;

    assert_eq!(conductor.state(), SessionState::Disconnected);
    assert!(conductor.viewers().is_empty());
    assert!(conductor.session().is_none());
    // The relay is unreachable; nothing must be sent to it during teardown.
    assert_eq!(transport.viewer_removed_count("v1"), 0);
    assert_eq!(transport.viewer_removed_count("v2"), 0);
}

#[tokio::test]
async fn audio_opt_in_is_per_viewer() {
    let transport = MockTransport::new();
    let backend = Arc::new(SyntheticBackend::new());
    let (conductor, _events) = test_conductor(transport.clone(), backend);

    conductor.connect("wss://relay.test").await.unwrap();
    conductor
        .accept_cast_request(cast_request("v1", "Alice"))
        .await
        .unwrap();

    assert!(conductor.set_viewer_audio("v1", true));
    assert!(!conductor.set_viewer_audio("missing", true));
}
