//! WebSocket transport for sessions.
//!
//! Architecture:
//! - [`WsConnector::connect`] performs the WebSocket handshake and splits the
//!   stream into a read half and a write half.
//! - A **reader task** turns every inbound message into a session event:
//!   text and binary frames become [`SessionEvent::Message`], a close frame
//!   or end of stream becomes [`SessionEvent::Closed`], and a protocol or
//!   I/O error becomes [`SessionEvent::Errored`].
//! - A **writer task** owns the write half and sends queued frames in the
//!   order [`Link::send`] was called.
//!
//! WebSocket-level ping/pong is answered by tokio-tungstenite itself and
//! never reaches the session.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info};

use crate::application::session::{Connector, EventSender, Link, SessionError, SessionEvent};
use vstream_core::Frame;

/// Connects sessions over WebSocket (`ws://` or `wss://`).
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

enum Outbound {
    Frame(Frame),
    Close,
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str, events: EventSender) -> Result<Box<dyn Link>, SessionError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| SessionError::HandshakeFailure(e.to_string()))?;
        info!("WebSocket connected (HTTP {})", response.status());

        let (mut ws_tx, mut ws_rx) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();

        // ── Writer ────────────────────────────────────────────────────────────
        let writer_events = events.clone();
        tokio::spawn(async move {
            while let Some(outbound) = out_rx.recv().await {
                let message = match outbound {
                    Outbound::Frame(Frame::Binary(data)) => WsMessage::Binary(data.to_vec()),
                    Outbound::Frame(Frame::Text(text)) => WsMessage::Text(text),
                    Outbound::Close => {
                        if let Err(e) = ws_tx.close().await {
                            debug!("WebSocket close handshake failed: {e}");
                        }
                        break;
                    }
                };
                if let Err(e) = ws_tx.send(message).await {
                    let _ = writer_events.send(SessionEvent::Errored(e.to_string()));
                    break;
                }
            }
        });

        // ── Reader ────────────────────────────────────────────────────────────
        let reader = tokio::spawn(async move {
            loop {
                let event = match ws_rx.next().await {
                    Some(Ok(WsMessage::Binary(data))) => {
                        SessionEvent::Message(Frame::Binary(Bytes::from(data)))
                    }
                    Some(Ok(WsMessage::Text(text))) => SessionEvent::Message(Frame::Text(text)),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        let _ = events.send(SessionEvent::Closed);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = events.send(SessionEvent::Errored(e.to_string()));
                        break;
                    }
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(WsLink {
            outbound: out_tx,
            reader: Some(reader),
        }))
    }
}

/// An open WebSocket connection.
struct WsLink {
    outbound: mpsc::UnboundedSender<Outbound>,
    reader: Option<JoinHandle<()>>,
}

impl Link for WsLink {
    fn send(&mut self, frame: Frame) -> Result<(), SessionError> {
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| SessionError::Transport("WebSocket writer has stopped".to_string()))
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            let _ = self.outbound.send(Outbound::Close);
            reader.abort();
        }
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_closed_port_is_handshake_failure() {
        // Arrange: bind then drop a listener so the port is free but closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (tx, _rx) = mpsc::unbounded_channel();

        // Act
        let result = WsConnector::new().connect(&format!("ws://{addr}/c/k/publish"), tx).await;

        // Assert
        assert!(matches!(result, Err(SessionError::HandshakeFailure(_))));
    }

    #[tokio::test]
    async fn test_inbound_frames_become_session_events() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(WsMessage::Text("ERROR: Invalid streaming key".into())).await.unwrap();
            ws.send(WsMessage::Binary(vec![1, 2, 3])).await.unwrap();
            ws.close(None).await.unwrap();
        });
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        let _link = WsConnector::new().connect(&format!("ws://{addr}/c/k/receive"), tx).await.unwrap();

        // Assert
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Message(Frame::Text(t))) if t == "ERROR: Invalid streaming key"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Message(Frame::Binary(b))) if b[..] == [1u8, 2, 3]
        ));
        assert!(matches!(rx.recv().await, Some(SessionEvent::Closed)));
    }
}
