//! # WorkerScheduler: a single cooperative worker presented as a scheduler.
//!
//! Library code written against the full [`Scheduler`] surface can be reused
//! when only a [`Worker`] is available, e.g. when a caller wants every
//! emitted task funneled through one pre-chosen worker. [`WorkerScheduler`]
//! forwards `schedule*` and disposal straight to the wrapped worker;
//! [`Scheduler::create_worker`] hands out **derived** views instead of the
//! worker itself.
//!
//! ## Derived workers
//! ```text
//!                 WorkerScheduler ── dispose ──► base worker
//!                   │
//!         create_worker()  create_worker()
//!             ▼                  ▼
//!        DerivedWorker W1   DerivedWorker W2
//!          [composite]        [composite]
//!             │                  │
//!         dispose W1 cancels W1's tasks only;
//!         W2 and the base worker are unaffected
//! ```
//!
//! A derived worker scopes task lifetimes to a transient view over the
//! shared worker: every handle it returns is registered in its composite
//! before the call returns, and disposing the view cancels exactly those
//! tasks.

use std::sync::Arc;
use std::time::Duration;

use crate::error::SchedulerError;
use crate::schedulers::composite::CompositeDisposable;
use crate::schedulers::disposable::{Disposable, DisposableRef, TaskHandle};
use crate::schedulers::scheduler::{PeriodicTask, Scheduler, Task, Worker};

/// # Scheduler facade over one shared [`Worker`].
///
/// Disposing the scheduler disposes the wrapped worker. Workers returned by
/// [`Scheduler::create_worker`] are derived views and never dispose the
/// wrapped worker implicitly.
pub struct WorkerScheduler {
    worker: Arc<dyn Worker>,
}

impl WorkerScheduler {
    /// Wraps `worker`, typically acquired from some other scheduler's
    /// `create_worker`.
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self { worker }
    }
}

impl Scheduler for WorkerScheduler {
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError> {
        self.worker.schedule(task)
    }

    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError> {
        self.worker.schedule_delayed(task, delay)
    }

    fn schedule_periodically(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError> {
        self.worker.schedule_periodically(task, initial_delay, period)
    }

    fn create_worker(&self) -> Arc<dyn Worker> {
        Arc::new(DerivedWorker::new(Arc::clone(&self.worker)))
    }

    fn dispose(&self) {
        self.worker.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.worker.is_disposed()
    }
}

/// Transient view over a shared base worker.
///
/// Tasks scheduled through the view are registered in its composite before
/// the schedule call returns. Disposing the view disposes exactly those
/// handles. Scheduling on a disposed view returns an already-disposed handle
/// and the base worker never sees the task; a `dispose` racing a `schedule`
/// is settled by the composite, which disposes any handle that arrives late.
pub(crate) struct DerivedWorker {
    base: Arc<dyn Worker>,
    tasks: CompositeDisposable,
}

impl DerivedWorker {
    pub(crate) fn new(base: Arc<dyn Worker>) -> Self {
        Self {
            base,
            tasks: CompositeDisposable::new(),
        }
    }

    fn track(&self, handle: DisposableRef) -> DisposableRef {
        self.tasks.add(Arc::clone(&handle));
        handle
    }
}

impl Worker for DerivedWorker {
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError> {
        if self.tasks.is_disposed() {
            return Ok(TaskHandle::disposed_ref());
        }
        Ok(self.track(self.base.schedule(task)?))
    }

    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError> {
        if self.tasks.is_disposed() {
            return Ok(TaskHandle::disposed_ref());
        }
        Ok(self.track(self.base.schedule_delayed(task, delay)?))
    }

    fn schedule_periodically(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError> {
        if self.tasks.is_disposed() {
            return Ok(TaskHandle::disposed_ref());
        }
        Ok(self.track(self.base.schedule_periodically(task, initial_delay, period)?))
    }

    fn dispose(&self) {
        self.tasks.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.tasks.is_disposed()
    }
}
