use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Identifies the resource a session wants exclusive access to.
///
/// The key is opaque to the kernel; the only rule is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Validates a raw key, typically the `id` query parameter.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::Request("id required".to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Point-in-time view of one registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub key: ResourceKey,
    /// Whether a session currently holds the token
    pub held: bool,
    /// Sessions parked in `take()` for this key
    pub waiting: usize,
}
