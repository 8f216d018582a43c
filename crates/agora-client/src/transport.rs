//! WebSocket transport for one live connection
//!
//! Thin wrapper over tokio-tungstenite: authenticates at the upgrade,
//! serializes outbound frames, and turns the inbound byte stream into typed
//! [`TransportEvent`]s. Reconnection policy lives above this, in the session
//! loop.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use agora_core::{ClientFrame, ServerFrame};

use crate::error::ClientError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// What the transport observed on the wire
#[derive(Debug)]
pub enum TransportEvent {
    /// A parsed inbound frame
    Frame(ServerFrame),
    /// The peer closed the connection
    Closed { code: Option<u16>, reason: String },
}

/// One open WebSocket connection to the chat gateway
pub struct SessionTransport {
    sink: WsSink,
    stream: WsStream,
}

impl SessionTransport {
    /// Open and authenticate a connection
    ///
    /// The token rides as a query parameter so the handshake itself carries
    /// identity. A 401/403 at the upgrade is an auth rejection, not a
    /// transport fault, and must not be retried.
    pub async fn connect(ws_url: &str, token: &str) -> Result<Self, ClientError> {
        let url = format!("{ws_url}?token={token}");
        let (socket, _response) = connect_async(url.as_str()).await.map_err(classify_connect)?;
        debug!(%ws_url, "websocket open");

        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    /// Serialize and send one client frame
    pub async fn send(&mut self, frame: &ClientFrame) -> Result<(), ClientError> {
        let payload = frame.to_json()?;
        self.sink.send(WsMessage::Text(payload)).await?;
        Ok(())
    }

    /// Next inbound event, or `None` once the stream is exhausted
    ///
    /// Malformed frames are dropped and reading continues; one bad payload
    /// never ends the session.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(raw)) => match ServerFrame::from_json(&raw) {
                    Ok(frame) => return Some(TransportEvent::Frame(frame)),
                    Err(error) => warn!(%error, "dropping malformed frame"),
                },
                Ok(WsMessage::Close(close)) => {
                    let (code, reason) = match close {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::new()),
                    };
                    debug!(?code, %reason, "peer closed connection");
                    return Some(TransportEvent::Closed { code, reason });
                }
                // Ping/pong are answered by the library; binary is not
                // part of this protocol
                Ok(_) => {}
                Err(error) => {
                    return Some(TransportEvent::Closed {
                        code: None,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    /// Close the connection politely; errors are irrelevant at this point
    pub async fn close(mut self) {
        let _ = self.sink.send(WsMessage::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

impl std::fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTransport").finish_non_exhaustive()
    }
}

/// Distinguish an auth rejection at the upgrade from a transport fault
fn classify_connect(error: WsError) -> ClientError {
    if let WsError::Http(response) = &error {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return ClientError::Auth;
        }
    }
    ClientError::Transport(error)
}
