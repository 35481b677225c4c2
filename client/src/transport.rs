//! The byte pipe between a session and the server

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use sdgym_protocol::frame_text;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// Where protocol text comes from and goes to.
///
/// `recv` yields text chunks in arrival order; a chunk may hold any number of lines,
/// including a partial one. `Ok(None)` means the peer closed the connection.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&mut self, message: String) -> Result<()>;

    async fn recv(&mut self) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket connection to a Showdown server
pub struct WsTransport {
    ws: WsStream,
}

impl WsTransport {
    /// Connect to a websocket URL such as `ws://localhost:8000/showdown/websocket`
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _response) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        Ok(Self { ws })
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, message: String) -> Result<()> {
        self.ws
            .send(Message::Text(message))
            .await
            .context("Failed to send message")
    }

    /// Each websocket message is one frame; it is returned blank-line terminated
    async fn recv(&mut self) -> Result<Option<String>> {
        while let Some(message) = self.ws.next().await {
            match message.context("WebSocket error")? {
                Message::Text(text) => return Ok(Some(frame_text(&text))),
                Message::Close(_) => return Ok(None),
                // tungstenite queues the pong for pings itself
                _ => {}
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close websocket")
    }
}
