//! Cooperative cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Session-scoped cancellation flag.
///
/// One token is created per pipeline invocation and passed down the call
/// chain; it is never shared between sessions and never auto-cleared.
/// Cancellation is cooperative: pipelines poll the token between phases
/// and between per-element iterations, so an in-flight host call is
/// never interrupted and an already-started unit finishes its restore
/// step before the session stops.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
        info!("Cancellation requested");
    }

    /// Whether cancellation has been requested.
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
