//! Message transports.
//!
//! A [`Transport`] is one long-lived duplex text channel to a relay. A
//! [`Connector`] opens them. The pool picks its connector once at
//! construction; [`WebSocketConnector`] is the native driver.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Duplex text channel to a single relay.
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Read the next text frame.
    ///
    /// `Ok(None)` means nothing usable arrived: a control or binary frame, or
    /// the end of the stream.
    async fn recv(&mut self) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens transports to relay URLs.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport
pub struct WebSocketTransport {
    url: Url,
    stream: WsStream,
}

impl WebSocketTransport {
    pub fn new(url: Url, stream: WsStream) -> Self {
        Self { url, stream }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        match self.stream.next().await {
            Some(Ok(Message::Text(text))) => Ok(Some(text.as_str().to_owned())),
            Some(Ok(Message::Ping(data))) => {
                self.stream
                    .send(Message::Pong(data))
                    .await
                    .map_err(|e| ClientError::Transport(e.to_string()))?;
                Ok(None)
            }
            Some(Ok(Message::Close(frame))) => {
                debug!("Relay {} sent close frame: {:?}", self.url, frame);
                Ok(None)
            }
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => Err(ClientError::Transport(e.to_string())),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

/// Connector for `ws://` and `wss://` relays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>> {
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Box::new(WebSocketTransport::new(url.clone(), stream)))
    }
}
