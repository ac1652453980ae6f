//! Websocket client facade for the lock server.
//!
//! ```no_run
//! # async fn demo() -> keylock_core::Result<()> {
//! use keylock_core::client::LockClient;
//!
//! let client = LockClient::new("ws://127.0.0.1:3200/ws")?;
//! let handle = client.lock("reports-nightly").await?;
//! // ... exclusive work ...
//! client.unlock(Some(handle)).await?;
//! # Ok(())
//! # }
//! ```

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol;
use crate::types::ResourceKey;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials the lock server for each [`lock`](Self::lock) call.
#[derive(Debug, Clone)]
pub struct LockClient {
    endpoint: Url,
}

impl LockClient {
    /// `endpoint` is the server's lock route, e.g. `ws://host:3200/ws`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        match endpoint.scheme() {
            "ws" | "wss" => Ok(Self { endpoint }),
            other => Err(Error::Config(format!(
                "endpoint scheme must be ws or wss, got '{}'",
                other
            ))),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Opens a session for `key` and waits, without a timeout, for the grant.
    pub async fn lock(&self, key: &str) -> Result<LockHandle> {
        let key = ResourceKey::parse(key)?;
        let url = self.url_for(&key);

        let (mut stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Connection(format!("failed to dial {}: {}", url, e)))?;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) if protocol::is_grant(&text) => break,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(Error::Protocol(format!(
                        "connection closed before lock on '{}' was granted",
                        key
                    )));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(Error::Protocol(format!(
                        "connection lost before lock on '{}' was granted: {}",
                        key, e
                    )));
                }
            }
        }

        tracing::debug!(key = %key, "lock granted");
        Ok(LockHandle { key, stream })
    }

    /// Releases a held lock. `None` is a no-op.
    pub async fn unlock(&self, handle: Option<LockHandle>) -> Result<()> {
        match handle {
            Some(handle) => handle.unlock().await,
            None => Ok(()),
        }
    }

    /// Any `id` already present on the endpoint (e.g. `ws://host/ws?id=`) is replaced.
    pub(crate) fn url_for(&self, key: &ResourceKey) -> Url {
        let kept: Vec<(String, String)> = self
            .endpoint
            .query_pairs()
            .filter(|(name, _)| name != protocol::KEY_PARAM)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.endpoint.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(kept);
            query.append_pair(protocol::KEY_PARAM, key.as_str());
        }
        url
    }
}

/// A granted lock. Dropping it without [`unlock`](Self::unlock) closes the
/// connection, which the server treats as a release.
pub struct LockHandle {
    key: ResourceKey,
    stream: WsStream,
}

impl std::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle").field("key", &self.key).finish_non_exhaustive()
    }
}

impl LockHandle {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Sends the release keyword. Does not wait for the server to acknowledge.
    pub async fn unlock(mut self) -> Result<()> {
        self.stream
            .send(Message::Text(protocol::RELEASE.into()))
            .await
            .map_err(|e| Error::Connection(format!("failed to release '{}': {}", self.key, e)))?;

        // The server ends the session on its own; the close frame is a courtesy.
        let _ = self.stream.close(None).await;
        tracing::debug!(key = %self.key, "lock released");
        Ok(())
    }
}
