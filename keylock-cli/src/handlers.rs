use serde::{Deserialize, Serialize};

use keylock_core::types::{KeyStatus, ResourceKey};
use keylock_core::Result;

// ─── Request Types ──────────────────────────────────────────────────────────

/// Query string of the websocket route: `/ws?id=<key>`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub id: Option<String>,
}

impl ConnectParams {
    pub fn resource_key(&self) -> Result<ResourceKey> {
        ResourceKey::parse(self.id.as_deref().unwrap_or_default())
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Keys ever requested since startup
    pub keys: usize,
    /// Keys currently held by a session
    pub held: usize,
    pub version: String,
}

#[derive(Serialize)]
pub struct LockInfo {
    pub key: String,
    pub held: bool,
    pub waiting: usize,
}

impl From<KeyStatus> for LockInfo {
    fn from(status: KeyStatus) -> Self {
        Self {
            key: status.key.to_string(),
            held: status.held,
            waiting: status.waiting,
        }
    }
}
