//! `keylock exec`: run a command while holding a lock.

use tokio::process::Command;

use keylock_core::client::LockClient;

/// Returns the child's exit code. The lock is released even if the command
/// cannot be started.
pub async fn run(server: &str, id: &str, command: &[String]) -> Result<i32, String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| "no command given".to_string())?;

    let client = LockClient::new(server).map_err(|e| e.to_string())?;

    tracing::info!(key = %id, server = %server, "waiting for lock");
    let handle = client.lock(id).await.map_err(|e| e.to_string())?;
    tracing::info!(key = %id, "lock acquired, running {}", program);

    let status = Command::new(program).args(args).status().await;

    if let Err(e) = client.unlock(Some(handle)).await {
        // Disconnecting releases the lock server-side anyway.
        tracing::warn!(key = %id, "explicit unlock failed: {}", e);
    }

    let status = status.map_err(|e| format!("failed to run '{}': {}", program, e))?;
    tracing::info!(key = %id, %status, "command finished, lock released");

    Ok(status.code().unwrap_or(1))
}
