//! JSON-over-WebSocket transport.
//!
//! One reader task parses relay frames into [`SignalingEvent`]s; one
//! writer task drains an outbound queue so senders never hold the socket.
//! Socket loss surfaces as a single `ConnectionLost` event.

use std::sync::Mutex;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use sharecast_capture::{AudioChunk, CursorInfo, Frame};
use sharecast_common::error::{SharecastError, SharecastResult};

use crate::transport::SignalingTransport;
use crate::types::SignalingEvent;
use crate::wire::{ClientMessage, ServerMessage};

/// WebSocket implementation of [`SignalingTransport`].
pub struct WsTransport {
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            outbound: Mutex::new(None),
        }
    }

    fn send_wire(&self, msg: &ClientMessage) -> SharecastResult<()> {
        let json = serde_json::to_string(msg)?;
        let guard = self.outbound.lock().unwrap();
        let tx = guard
            .as_ref()
            .ok_or_else(|| SharecastError::connection("not connected to relay"))?;
        tx.send(Message::Text(json.into()))
            .map_err(|_| SharecastError::connection("relay connection closed"))
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SignalingTransport for WsTransport {
    async fn connect(
        &self,
        host: &str,
    ) -> SharecastResult<mpsc::UnboundedReceiver<SignalingEvent>> {
        let (ws, _) = connect_async(host)
            .await
            .map_err(|e| SharecastError::connection(format!("relay handshake failed: {e}")))?;
        tracing::info!(host, "Connected to signaling relay");

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (evt_tx, evt_rx) = mpsc::unbounded_channel::<SignalingEvent>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let pong_tx = out_tx.clone();
        tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(text.as_ref()) {
                            Ok(msg) => {
                                let event = match msg {
                                    ServerMessage::SessionId { session_id } => {
                                        SignalingEvent::SessionIdAssigned(session_id)
                                    }
                                    ServerMessage::CastRequest(req) => {
                                        SignalingEvent::CastRequested(req)
                                    }
                                    ServerMessage::ViewerDisconnected { viewer_id } => {
                                        SignalingEvent::ViewerDisconnected { viewer_id }
                                    }
                                };
                                if evt_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Unparseable relay frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = pong_tx.send(Message::Pong(data));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Relay closed the signaling connection");
                        let _ = evt_tx.send(SignalingEvent::ConnectionLost);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Signaling socket error");
                        let _ = evt_tx.send(SignalingEvent::ConnectionLost);
                        break;
                    }
                }
            }
        });

        *self.outbound.lock().unwrap() = Some(out_tx);
        Ok(evt_rx)
    }

    async fn send_device_info(
        &self,
        service_id: &str,
        machine_name: &str,
    ) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::DeviceInfo {
            service_id: service_id.to_string(),
            machine_name: machine_name.to_string(),
        })
    }

    async fn request_session_id(&self) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::GetSessionId)
    }

    async fn send_viewer_removed(&self, viewer_id: &str) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::ViewerRemoved {
            viewer_id: viewer_id.to_string(),
        })
    }

    async fn send_cursor_change(
        &self,
        cursor: &CursorInfo,
        viewer_ids: &[String],
    ) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::CursorChange {
            cursor: cursor.clone(),
            viewer_ids: viewer_ids.to_vec(),
        })
    }

    async fn send_frame(&self, viewer_id: &str, frame: &Frame) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::Frame {
            viewer_id: viewer_id.to_string(),
            frame: frame.clone(),
        })
    }

    async fn send_audio(&self, chunk: &AudioChunk, viewer_ids: &[String]) -> SharecastResult<()> {
        self.send_wire(&ClientMessage::Audio {
            chunk: chunk.clone(),
            viewer_ids: viewer_ids.to_vec(),
        })
    }
}
