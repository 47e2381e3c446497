//! # Scheduler and worker capability surfaces.
//!
//! [`Scheduler`] is the full surface the reactive runtime programs against:
//! immediate, delayed and fixed-rate submission, a monotonic clock, worker
//! derivation and disposal. [`Worker`] is the cooperative subset handed out
//! by [`Scheduler::create_worker`]; it schedules and disposes but cannot
//! derive further workers or read the clock.
//!
//! Tasks are plain closures. A one-shot [`Task`] runs at most once; a
//! [`PeriodicTask`] is re-fired by the scheduler until its handle is
//! disposed. Bodies must not block the executing thread for long; the loop
//! behind an [`EventLoop`](crate::EventLoop) is strictly serial.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::SchedulerError;
use crate::schedulers::disposable::DisposableRef;

/// One-shot unit of work accepted by `schedule` / `schedule_delayed`.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Repeatedly fired body accepted by `schedule_periodically`.
pub type PeriodicTask = Box<dyn FnMut() + Send + 'static>;

/// Process-wide epoch backing [`Scheduler::now`].
///
/// Shared by every scheduler so that deadline math composes across
/// scheduler instances.
static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

pub(crate) fn clock_now() -> Duration {
    CLOCK_EPOCH.get_or_init(Instant::now).elapsed()
}

/// # Full scheduling surface.
///
/// Implemented by [`EventLoop`](crate::EventLoop) and
/// [`WorkerScheduler`](crate::WorkerScheduler). All submissions return a
/// cancellation handle; disposing the handle before the task starts prevents
/// execution, disposing after has no effect on the in-flight run.
///
/// Submitting to a disposed scheduler fails synchronously with
/// [`SchedulerError::Disposed`] and the task never runs.
pub trait Scheduler: Send + Sync {
    /// Enqueues `task` for as-soon-as-possible execution.
    ///
    /// Tasks submitted from a single producer thread run in submission order.
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError>;

    /// Enqueues `task` to run after at least `delay`.
    ///
    /// Deadline order is honored; equal deadlines fall back to submission
    /// order.
    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError>;

    /// Runs `task` after `initial_delay`, then at fixed-rate intervals of
    /// `period`.
    ///
    /// Successive firings never overlap: a body that overruns `period` delays
    /// the queued firings, which are then dispatched back-to-back without
    /// catch-up compression.
    fn schedule_periodically(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError>;

    /// Current reading of the scheduler clock.
    ///
    /// Monotonic, measured against a process-wide epoch shared by all
    /// schedulers. Callers pick their unit through [`Duration`] accessors.
    fn now(&self) -> Duration {
        clock_now()
    }

    /// Returns a worker whose disposal cancels exactly the tasks scheduled
    /// through it, never the scheduler itself.
    fn create_worker(&self) -> Arc<dyn Worker>;

    /// Terminates the scheduler. Final and idempotent.
    fn dispose(&self);

    /// Whether [`Scheduler::dispose`] has taken effect.
    fn is_disposed(&self) -> bool;

    /// Optional warmup of underlying resources. Default: nothing to warm.
    fn start(&self) {}
}

/// # Cooperative worker surface.
///
/// The subset of [`Scheduler`] a caller holds when it wants all emitted work
/// funneled through one pre-chosen execution context. Dispose semantics are
/// the implementation's: a derived worker cancels its own tasks, while a
/// scheduler-owned base worker may tear down more.
pub trait Worker: Send + Sync {
    /// Enqueues `task` for as-soon-as-possible execution.
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError>;

    /// Enqueues `task` to run after at least `delay`.
    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError>;

    /// Runs `task` after `initial_delay`, then every `period`, non-overlapping.
    fn schedule_periodically(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError>;

    /// Cancels outstanding work owned by this worker. Idempotent.
    fn dispose(&self);

    /// Whether [`Worker::dispose`] has taken effect.
    fn is_disposed(&self) -> bool;
}
