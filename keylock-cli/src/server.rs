use std::sync::Arc;

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use keylock_core::protocol;
use keylock_core::registry::Registry;
use keylock_core::session::Session;
use keylock_core::{Error, Result};

use crate::config::ServeConfig;
use crate::handlers::*;
use crate::transport::WsConnection;

pub type AppState = Arc<Registry>;

pub async fn run(config: &ServeConfig) -> Result<()> {
    let addr = config.listen_addr().await?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!("🔒 keylock server listening on ws://{}{}", addr, protocol::LOCK_PATH);

    LockServer::new(Arc::new(Registry::new()))
        .serve(listener)
        .await
}

/// The lock service: one registry plus the routes that expose it.
#[derive(Clone)]
pub struct LockServer {
    registry: AppState,
}

impl LockServer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(protocol::LOCK_PATH, get(lock_session))
            .route("/health", get(health))
            .route("/locks", get(list_locks))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.registry))
    }

    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Connection(format!("server error: {}", e)))
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn lock_session(
    State(registry): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let key = match params.resource_key() {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!("🚫 rejected lock request: {}", e);
            return (StatusCode::BAD_REQUEST, "id required").into_response();
        }
    };

    ws.on_upgrade(move |socket| async move {
        let session = Session::new(key, WsConnection::new(socket));
        tracing::debug!(session_id = %session.id(), key = %session.key(), "session opened");
        session.run(&registry).await;
    })
}

pub(crate) async fn health(State(registry): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let snapshot = registry.snapshot();
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        keys: snapshot.len(),
        held: snapshot.iter().filter(|s| s.held).count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

pub(crate) async fn list_locks(
    State(registry): State<AppState>,
) -> Json<ApiResponse<Vec<LockInfo>>> {
    let locks = registry.snapshot().into_iter().map(LockInfo::from).collect();
    Json(ApiResponse::ok(locks))
}
