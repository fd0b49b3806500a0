//! Realtime channel transports
//!
//! [`WsConnector`] opens an Engine.IO WebSocket to the service. Any other
//! connector (an in-process server in tests) plugs in through the same traits.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use shared::error::{AppError, ErrorCode};
use shared::message::Packet;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ClientError, ClientResult};

pub(crate) fn channel_error(message: impl Into<String>) -> ClientError {
    AppError::with_message(ErrorCode::ChannelDisconnected, message).into()
}

/// One open connection
#[async_trait]
pub trait ChannelTransport: Send {
    async fn send(&mut self, packet: Packet) -> ClientResult<()>;

    /// Next packet; `None` once the connection is gone
    async fn recv(&mut self) -> Option<ClientResult<Packet>>;

    async fn close(&mut self) -> ClientResult<()>;
}

/// Opens connections; called once per (re)connection attempt
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(&self) -> ClientResult<Box<dyn ChannelTransport>>;
}

// ========== WebSocket ==========

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&self) -> ClientResult<Box<dyn ChannelTransport>> {
        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| channel_error(format!("WebSocket connect to {} failed: {}", self.url, e)))?;
        tracing::debug!(url = %self.url, "WebSocket opened");
        Ok(Box::new(WsTransport { stream }))
    }
}

pub struct WsTransport {
    stream: WsStream,
}

#[async_trait]
impl ChannelTransport for WsTransport {
    async fn send(&mut self, packet: Packet) -> ClientResult<()> {
        self.stream
            .send(Message::Text(packet.encode().into()))
            .await
            .map_err(|e| channel_error(format!("WebSocket send failed: {}", e)))
    }

    async fn recv(&mut self) -> Option<ClientResult<Packet>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(Packet::decode(text.as_str()).map_err(|e| AppError::from(e).into()));
                }
                Ok(Message::Ping(data)) => {
                    let _ = self.stream.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => {} // Binary, Pong, Frame
                Err(e) => return Some(Err(channel_error(format!("WebSocket error: {}", e)))),
            }
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| channel_error(format!("WebSocket close failed: {}", e)))
    }
}
