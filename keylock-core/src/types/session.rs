use serde::{Deserialize, Serialize};

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Key validated, registry not touched yet
    Connecting,
    /// Parked on the key's token
    Waiting,
    /// Holds the token, grant signal sent
    Granted,
    /// Terminal; the token (if ever taken) has been given back
    Released,
}

impl SessionState {
    /// Legal forward moves. `Waiting -> Released` is an abandoned wait.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Connecting, SessionState::Waiting)
                | (SessionState::Waiting, SessionState::Granted)
                | (SessionState::Waiting, SessionState::Released)
                | (SessionState::Granted, SessionState::Released)
        )
    }
}

/// Why a granted session gave its token back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseCause {
    /// The client sent the release keyword
    Unlock,
    /// The connection closed or broke while holding the token
    Disconnect,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The client left before the token was obtained; nothing was held
    Abandoned,
    /// The token was held and then given back exactly once
    Released(ReleaseCause),
}
