//! # Composite cancellation.
//!
//! [`CompositeDisposable`] tracks the handles a derived worker has scheduled
//! so they can be cancelled as a group. The set has a terminal disposed
//! state: once disposed it stays disposed, and any handle that races in is
//! disposed on arrival rather than registered.
//!
//! ## Rules
//! - `add` registers the handle before returning (`false` means the
//!   composite was already disposed and the handle was disposed instead).
//! - `dispose` drains the set and disposes every tracked handle, exactly once.
//! - `remove` forgets a handle without disposing it.

use std::sync::Arc;
use std::sync::Mutex;

use crate::schedulers::disposable::{Disposable, DisposableRef};

/// Ordered set of cancellation handles with a terminal disposed state.
///
/// `None` is the terminal state; the mutex serializes concurrent `add` and
/// `dispose` so no handle survives a completed `dispose()`.
pub struct CompositeDisposable {
    inner: Mutex<Option<Vec<DisposableRef>>>,
}

impl CompositeDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Some(Vec::new())),
        }
    }

    /// Registers `handle` with the composite.
    ///
    /// Returns `true` when the handle was tracked. If the composite is
    /// already disposed the handle is disposed immediately and `false` is
    /// returned.
    pub fn add(&self, handle: DisposableRef) -> bool {
        let mut guard = self.inner.lock().unwrap();
        match guard.as_mut() {
            Some(handles) => {
                handles.push(handle);
                true
            }
            None => {
                drop(guard);
                handle.dispose();
                false
            }
        }
    }

    /// Forgets `handle` (pointer identity) without disposing it.
    ///
    /// Returns `true` when the handle was tracked.
    pub fn remove(&self, handle: &DisposableRef) -> bool {
        let mut guard = self.inner.lock().unwrap();
        if let Some(handles) = guard.as_mut() {
            if let Some(idx) = handles.iter().position(|h| Arc::ptr_eq(h, handle)) {
                handles.remove(idx);
                return true;
            }
        }
        false
    }

    /// Number of handles currently tracked. Zero once disposed.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CompositeDisposable {
    fn default() -> Self {
        Self::new()
    }
}

impl Disposable for CompositeDisposable {
    /// Disposes every tracked handle and seals the composite.
    fn dispose(&self) {
        let drained = self.inner.lock().unwrap().take();
        if let Some(handles) = drained {
            for handle in handles {
                handle.dispose();
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.inner.lock().unwrap().is_none()
    }
}
