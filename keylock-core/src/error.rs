use thiserror::Error;

/// Errors surfaced by the lock kernel, the client facade and the server shell.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed listen address or client endpoint. Fatal at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request is missing its resource key.
    #[error("invalid request: {0}")]
    Request(String),

    /// Dial or write failure, or the peer went away unexpectedly.
    #[error("connection error: {0}")]
    Connection(String),

    /// The connection ended before the grant signal was observed.
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
