//! Wire vocabulary shared by the server session and the client facade.
//!
//! Every session runs over one websocket: the client names its key in the
//! `id` query parameter, the server answers with a single `go` text frame once
//! the key is held, and the client hands the key back with `unlock` (or by
//! hanging up).

/// Route the lock server mounts its websocket handler on.
pub const LOCK_PATH: &str = "/ws";

/// Query parameter carrying the resource key.
pub const KEY_PARAM: &str = "id";

/// Server → client: the caller now holds the key.
pub const GRANT: &str = "go";

/// Client → server: voluntary release.
pub const RELEASE: &str = "unlock";

/// Both keywords are matched without regard to letter case.
pub fn is_grant(text: &str) -> bool {
    text.eq_ignore_ascii_case(GRANT)
}

pub fn is_release(text: &str) -> bool {
    text.eq_ignore_ascii_case(RELEASE)
}
