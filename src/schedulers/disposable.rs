//! # Cancellation handles for scheduled work.
//!
//! Every `schedule*` call returns a [`DisposableRef`]. Disposing it before
//! the task starts prevents execution; disposing it after the task has begun
//! lets the current run finish (task bodies are never interrupted mid-flight).
//! Handles are idempotent and safe to dispose from any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// A handle over outstanding work that can be cancelled as a unit.
pub trait Disposable: Send + Sync {
    /// Cancels the underlying work. Idempotent, any-thread safe.
    fn dispose(&self);

    /// Whether the handle has reached its terminal state (cancelled, or the
    /// one-shot work it tracked has completed).
    fn is_disposed(&self) -> bool;
}

/// Shared handle form returned by schedulers and aggregated by workers.
pub type DisposableRef = Arc<dyn Disposable>;

/// Cancellation handle for a single scheduled task.
///
/// Pairs a [`CancellationToken`] (observed by the scheduled future at its
/// safe points: before the body starts, and between periodic firings) with a
/// completion flag so a finished one-shot task also reads as disposed.
pub struct TaskHandle {
    token: CancellationToken,
    done: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle already in the terminal state.
    ///
    /// Returned when scheduling races a completed disposal, e.g. on a
    /// disposed derived worker: the caller gets a well-formed handle, the
    /// task is never forwarded.
    pub fn disposed() -> Self {
        let handle = Self::new();
        handle.token.cancel();
        handle
    }

    pub(crate) fn disposed_ref() -> DisposableRef {
        Arc::new(Self::disposed())
    }

    /// Token observed by the scheduled future.
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Completion flag set by the scheduled future when the body finishes.
    pub(crate) fn completion(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.done)
    }
}

impl Disposable for TaskHandle {
    fn dispose(&self) {
        self.token.cancel();
    }

    fn is_disposed(&self) -> bool {
        self.token.is_cancelled() || self.done.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_is_idempotent() {
        let handle = TaskHandle::new();
        assert!(!handle.is_disposed());
        handle.dispose();
        handle.dispose();
        assert!(handle.is_disposed());
    }

    #[test]
    fn test_completion_reads_as_disposed() {
        let handle = TaskHandle::new();
        handle.completion().store(true, Ordering::Release);
        assert!(handle.is_disposed());
        assert!(!handle.token().is_cancelled());
    }

    #[test]
    fn test_pre_disposed_constructor() {
        assert!(TaskHandle::disposed().is_disposed());
    }
}
