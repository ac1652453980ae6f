use async_trait::async_trait;

use crate::error::Result;

/// One frame (or terminal condition) read from a session's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text payload
    Text(String),
    /// Binary, ping, pong and other control traffic
    Other,
    /// The peer closed the connection cleanly
    Closed,
    /// The read failed
    Broken(String),
}

/// Defines the contract a transport exposes to the session state machine.
///
/// `recv` must be cancel-safe: a session races it against the token wait and
/// drops whichever future loses.
#[async_trait]
pub trait Connection: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// Read the next frame. After `Closed` or `Broken` the session stops reading.
    async fn recv(&mut self) -> Inbound;

    /// Close the connection. Best effort.
    async fn close(&mut self);
}
