//! Per-connection lock session.
//!
//! A session claims one key for the lifetime of one connection:
//!
//! ```text
//! Connecting ──► Waiting ──► Granted ──► Released
//!                   │
//!                   └──(client left)──► Released (abandoned, token never taken)
//! ```
//!
//! While granted, the session waits for either a release request or the
//! connection going away. Both events go through the same release step, so
//! the token is given back exactly once whichever happens first.

use std::sync::Arc;

use crate::connection::{Connection, Inbound};
use crate::protocol;
use crate::registry::Registry;
use crate::token::{ExclusiveToken, TokenGuard};
use crate::types::{ReleaseCause, ResourceKey, SessionOutcome, SessionState};

/// Events that end a granted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ReleaseRequested,
    ConnectionClosed(String),
}

impl SessionEvent {
    fn cause(&self) -> ReleaseCause {
        match self {
            SessionEvent::ReleaseRequested => ReleaseCause::Unlock,
            SessionEvent::ConnectionClosed(_) => ReleaseCause::Disconnect,
        }
    }
}

pub struct Session<C> {
    id: String,
    key: ResourceKey,
    state: SessionState,
    conn: C,
}

impl<C: Connection> Session<C> {
    /// Starts a session for an already validated key.
    pub fn new(key: ResourceKey, conn: C) -> Self {
        Self {
            id: nanoid::nanoid!(10),
            key,
            state: SessionState::Connecting,
            conn,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Drives the session to its terminal state and closes the connection.
    pub async fn run(mut self, registry: &Registry) -> SessionOutcome {
        let token = registry.acquire_key_token(&self.key);

        self.transition(SessionState::Waiting);

        let outcome = match self.wait_for_token(token).await {
            Some(guard) => {
                self.transition(SessionState::Granted);
                tracing::info!(session_id = %self.id, key = %self.key, "lock granted");

                let event = self.hold(&guard).await;
                self.release(guard, event)
            }
            None => {
                self.transition(SessionState::Released);
                tracing::info!(session_id = %self.id, key = %self.key, "wait abandoned");
                SessionOutcome::Abandoned
            }
        };

        self.conn.close().await;
        outcome
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(self.state.can_advance_to(next), "{:?} -> {:?}", self.state, next);
        tracing::debug!(
            session_id = %self.id,
            key = %self.key,
            from = ?self.state,
            to = ?next,
            "session state"
        );
        self.state = next;
    }

    /// Races the token wait against the connection. `None` means the client
    /// went away (or asked to release) before the token was obtained.
    async fn wait_for_token(&mut self, token: Arc<ExclusiveToken>) -> Option<TokenGuard> {
        let take = token.take();
        tokio::pin!(take);

        loop {
            tokio::select! {
                biased;

                inbound = self.conn.recv() => match inbound {
                    // Giving up before the grant: no go/unlock round trip, token never taken.
                    Inbound::Text(text) if protocol::is_release(&text) => return None,
                    Inbound::Closed | Inbound::Broken(_) => return None,
                    Inbound::Text(_) | Inbound::Other => continue,
                },
                guard = &mut take => return Some(guard),
            }
        }
    }

    /// Sends the grant signal, then reads until something ends the session.
    async fn hold(&mut self, _guard: &TokenGuard) -> SessionEvent {
        if let Err(e) = self.conn.send_text(protocol::GRANT).await {
            return SessionEvent::ConnectionClosed(e.to_string());
        }

        loop {
            match self.conn.recv().await {
                Inbound::Text(text) if protocol::is_release(&text) => {
                    return SessionEvent::ReleaseRequested;
                }
                Inbound::Text(text) => {
                    tracing::debug!(session_id = %self.id, payload = %text, "ignoring payload");
                }
                Inbound::Other => {}
                Inbound::Closed => return SessionEvent::ConnectionClosed("closed by peer".into()),
                Inbound::Broken(reason) => return SessionEvent::ConnectionClosed(reason),
            }
        }
    }

    fn release(&mut self, guard: TokenGuard, event: SessionEvent) -> SessionOutcome {
        guard.give();
        self.transition(SessionState::Released);

        let cause = event.cause();
        match &event {
            SessionEvent::ReleaseRequested => {
                tracing::info!(session_id = %self.id, key = %self.key, ?cause, "lock released");
            }
            SessionEvent::ConnectionClosed(reason) => {
                tracing::info!(
                    session_id = %self.id,
                    key = %self.key,
                    ?cause,
                    reason = %reason,
                    "lock released on disconnect"
                );
            }
        }

        SessionOutcome::Released(cause)
    }
}
