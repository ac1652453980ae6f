//! Key → token mapping shared by every session on the server.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::token::ExclusiveToken;
use crate::types::{KeyStatus, ResourceKey};

/// Owns one [`ExclusiveToken`] per key ever requested.
///
/// The map mutex is held only for the lookup or insert; callers wait on the
/// returned token after it has been released, so waiting on one key never
/// blocks registry access for another. Entries are never evicted.
#[derive(Debug, Default)]
pub struct Registry {
    tokens: Mutex<HashMap<ResourceKey, Arc<ExclusiveToken>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the token for `key`.
    pub fn acquire_key_token(&self, key: &ResourceKey) -> Arc<ExclusiveToken> {
        let mut tokens = self.tokens.lock();
        if let Some(token) = tokens.get(key) {
            return Arc::clone(token);
        }

        tracing::debug!(key = %key, "creating token");
        let token = Arc::new(ExclusiveToken::new());
        tokens.insert(key.clone(), Arc::clone(&token));
        token
    }

    /// Number of keys that have ever been requested.
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }

    /// Status of every known key, sorted by key.
    pub fn snapshot(&self) -> Vec<KeyStatus> {
        let tokens = self.tokens.lock();
        let mut statuses: Vec<KeyStatus> = tokens
            .iter()
            .map(|(key, token)| KeyStatus {
                key: key.clone(),
                held: token.is_held(),
                waiting: token.waiting(),
            })
            .collect();
        drop(tokens);

        statuses.sort_by(|a, b| a.key.cmp(&b.key));
        statuses
    }
}
