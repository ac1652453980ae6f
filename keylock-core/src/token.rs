//! Single-capacity exclusive-access primitive, one per resource key.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A binary lock with `take`/`give` semantics.
///
/// `take` parks the caller until nobody holds the token; the returned
/// [`TokenGuard`] is the only proof of ownership. Giving the token back
/// consumes the guard, so a session cannot give twice. Wake order among
/// parked callers is not part of the contract.
#[derive(Debug, Default)]
pub struct ExclusiveToken {
    lock: Arc<Mutex<()>>,
    held: AtomicBool,
    waiting: AtomicUsize,
}

impl ExclusiveToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the token is available and takes it.
    ///
    /// Dropping the returned future before it resolves leaves the token
    /// untouched, which is how a waiting session abandons its claim.
    pub async fn take(self: Arc<Self>) -> TokenGuard {
        let parked = Parked::enter(&self.waiting);
        let guard = Arc::clone(&self.lock).lock_owned().await;
        drop(parked);

        self.held.store(true, Ordering::Release);
        TokenGuard {
            token: self,
            _guard: guard,
        }
    }

    /// Takes the token only if nobody holds it right now.
    pub fn try_take(self: Arc<Self>) -> Option<TokenGuard> {
        let guard = Arc::clone(&self.lock).try_lock_owned().ok()?;
        self.held.store(true, Ordering::Release);
        Some(TokenGuard {
            token: self,
            _guard: guard,
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Number of callers currently parked in [`take`](Self::take).
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }
}

/// Ownership of an [`ExclusiveToken`]. Dropping it gives the token back.
#[derive(Debug)]
pub struct TokenGuard {
    token: Arc<ExclusiveToken>,
    _guard: OwnedMutexGuard<()>,
}

impl TokenGuard {
    /// Marks the token available and wakes at most one parked caller.
    pub fn give(self) {
        drop(self);
    }
}

impl Drop for TokenGuard {
    fn drop(&mut self) {
        // Cleared before the mutex guard field is dropped.
        self.token.held.store(false, Ordering::Release);
    }
}

struct Parked<'a>(&'a AtomicUsize);

impl<'a> Parked<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
