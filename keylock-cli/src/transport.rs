//! Adapts an upgraded axum websocket to the session's `Connection` contract.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};

use keylock_core::connection::{Connection, Inbound};
use keylock_core::{Error, Result};

pub struct WsConnection {
    socket: WebSocket,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }

    async fn recv(&mut self) -> Inbound {
        match self.socket.recv().await {
            Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_string()),
            Some(Ok(Message::Close(_))) | None => Inbound::Closed,
            // Pings are answered by axum itself
            Some(Ok(_)) => Inbound::Other,
            Some(Err(e)) => Inbound::Broken(e.to_string()),
        }
    }

    async fn close(&mut self) {
        let _ = self.socket.send(Message::Close(None)).await;
    }
}
