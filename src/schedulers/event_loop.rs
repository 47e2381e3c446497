//! # EventLoop: the single-threaded execution context for one broker consumer.
//!
//! The broker consumer client is not thread-safe; the receiver pipeline posts
//! **every** call to it onto one [`EventLoop`] so serialization is implicit.
//! The loop owns a dedicated OS thread driving a current-thread `tokio`
//! runtime: ready tasks run FIFO, delayed and periodic tasks ride the
//! runtime's timer, and nothing ever runs concurrently with anything else on
//! the same loop.
//!
//! ## Architecture
//! ```text
//! pipeline threads                  loop thread "reactive-kafka-<group>-<N>"
//!   schedule(task) ──────────────►  ┌────────────────────────────────────┐
//!   schedule_delayed(task, d) ───►  │ current-thread runtime             │
//!   schedule_periodically(..) ───►  │   task │ task │ timer │ task │ ... │
//!                                   └────────────────────────────────────┘
//!                                     one thread, one task at a time
//! ```
//!
//! ## Rules
//! - Tasks submitted from one producer thread run in submission order.
//! - A task wrapper records the loop identity in a thread-local before the
//!   body runs; [`EventLoop::is_current_thread_on_loop`] reads it back so
//!   call sites already on the loop can skip re-posting (posting from a loop
//!   task and waiting on it would deadlock the loop).
//! - A panicking task is caught and logged with group context; the loop
//!   keeps serving. A panicking **periodic** task is cancelled after the log.
//! - The loop thread is marked non-blocking-preferred; long blocking calls
//!   on it are a contract violation (see [`is_non_blocking_thread`]).
//! - `dispose` is final and idempotent; later submissions fail with
//!   [`SchedulerError::Disposed`].

use std::any::Any;
use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::runtime;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;
use crate::schedulers::disposable::{DisposableRef, TaskHandle};
use crate::schedulers::scheduler::{PeriodicTask, Scheduler, Task, Worker};
use crate::schedulers::worker_scheduler::DerivedWorker;

/// Process-wide suffix counter for loop thread names.
static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Identity of the loop that owns the current thread; 0 = no loop.
    static CURRENT_LOOP: Cell<u64> = const { Cell::new(0) };
    /// Set on loop threads, which must not be used for blocking waits.
    static NON_BLOCKING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is marked non-blocking-preferred.
///
/// True on every event-loop thread. Runtime code that is about to park or
/// block can consult this to detect a contract violation.
pub fn is_non_blocking_thread() -> bool {
    NON_BLOCKING.get()
}

/// Names and spawns the loop thread.
///
/// The numeric suffix is claimed from [`THREAD_COUNTER`] when the factory is
/// built, so suffixes increase strictly in loop-creation order even though
/// the thread itself starts lazily.
struct EventThreadFactory {
    thread_name: String,
    loop_id: u64,
}

impl EventThreadFactory {
    const PREFIX: &'static str = "reactive-kafka-";

    fn new(group_id: &str) -> Self {
        let n = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        Self {
            thread_name: format!("{}{}-{}", Self::PREFIX, group_id, n),
            loop_id: n,
        }
    }

    fn spawn<F>(&self, body: F) -> io::Result<thread::JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                NON_BLOCKING.set(true);
                body();
            })
    }
}

enum LoopState {
    Idle,
    Running {
        handle: runtime::Handle,
        shutdown: CancellationToken,
    },
}

struct LoopInner {
    group_id: String,
    factory: EventThreadFactory,
    state: Mutex<LoopState>,
    disposed: AtomicBool,
}

impl LoopInner {
    /// Spawns the loop thread on first use and returns the runtime handle.
    fn ensure_started(&self) -> Result<runtime::Handle, SchedulerError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(SchedulerError::Disposed);
        }
        let mut state = self.state.lock().unwrap();
        // re-check under the lock; dispose may have won the race
        if self.disposed.load(Ordering::Acquire) {
            return Err(SchedulerError::Disposed);
        }
        if let LoopState::Running { handle, .. } = &*state {
            return Ok(handle.clone());
        }

        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<io::Result<runtime::Handle>>(1);
        self.factory
            .spawn(move || {
                let rt = match runtime::Builder::new_current_thread().enable_time().build() {
                    Ok(rt) => rt,
                    Err(source) => {
                        let _ = ready_tx.send(Err(source));
                        return;
                    }
                };
                if ready_tx.send(Ok(rt.handle().clone())).is_err() {
                    return;
                }
                rt.block_on(stop.cancelled());
                // dropping the runtime cancels everything still queued
            })
            .map_err(|source| SchedulerError::StartFailed { source })?;

        let handle = match ready_rx.recv() {
            Ok(Ok(handle)) => handle,
            Ok(Err(source)) => return Err(SchedulerError::StartFailed { source }),
            Err(_) => {
                return Err(SchedulerError::StartFailed {
                    source: io::Error::other("event loop thread exited during startup"),
                })
            }
        };
        *state = LoopState::Running {
            handle: handle.clone(),
            shutdown,
        };
        Ok(handle)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let state = self.state.lock().unwrap();
        if let LoopState::Running { shutdown, .. } = &*state {
            shutdown.cancel();
        }
    }
}

impl Drop for LoopInner {
    fn drop(&mut self) {
        // release the thread even when the loop was never disposed explicitly
        if let Ok(LoopState::Running { shutdown, .. }) = self.state.get_mut() {
            shutdown.cancel();
        }
    }
}

/// Runs one task body on the loop thread: records the loop identity, then
/// catches and logs a panicking body. Returns false when the body panicked.
fn run_on_loop(loop_id: u64, group_id: &str, body: impl FnOnce()) -> bool {
    CURRENT_LOOP.set(loop_id);
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => true,
        Err(payload) => {
            log_uncaught_panic(group_id, payload);
            false
        }
    }
}

fn log_uncaught_panic(group_id: &str, payload: Box<dyn Any + Send>) {
    let panic = panic_message(payload.as_ref());
    tracing::error!(
        group = group_id,
        panic,
        "event loop worker failed with an uncaught panic"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// # Single-threaded event scheduler for one consumer group.
///
/// Created once per consumer. The thread starts lazily on the first
/// submission (or [`Scheduler::start`]) and is named
/// `reactive-kafka-<group_id>-<N>` with a process-wide monotonic `N`, which
/// is part of the operational contract: thread dumps identify the consumer a
/// loop serves.
///
/// Cloning is cheap and shares the loop.
///
/// # Example
/// ```
/// use reactive_kafka::{EventLoop, Scheduler};
///
/// let event_loop = EventLoop::new("grp");
/// let on_loop = event_loop.clone();
/// event_loop
///     .schedule(Box::new(move || {
///         assert!(on_loop.is_current_thread_on_loop());
///     }))
///     .unwrap();
/// assert!(!event_loop.is_current_thread_on_loop());
/// event_loop.dispose();
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Arc<LoopInner>,
}

impl EventLoop {
    /// Creates the loop for `group_id`. The thread is not spawned yet.
    pub fn new(group_id: impl Into<String>) -> Self {
        let group_id = group_id.into();
        let factory = EventThreadFactory::new(&group_id);
        Self {
            inner: Arc::new(LoopInner {
                group_id,
                factory,
                state: Mutex::new(LoopState::Idle),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Consumer group this loop serves.
    pub fn group_id(&self) -> &str {
        &self.inner.group_id
    }

    /// Name carried by the loop thread, fixed at construction.
    pub fn thread_name(&self) -> &str {
        &self.inner.factory.thread_name
    }

    /// True iff the caller is executing inside a task dispatched through
    /// this loop.
    ///
    /// Call sites use this to skip re-posting when already on the loop;
    /// a task that posts to its own loop and waits for the result would
    /// deadlock. The identity is recorded by the task wrapper and never
    /// cleared: the loop thread runs nothing but loop tasks.
    pub fn is_current_thread_on_loop(&self) -> bool {
        CURRENT_LOOP.get() == self.inner.loop_id()
    }
}

impl LoopInner {
    fn loop_id(&self) -> u64 {
        self.factory.loop_id
    }
}

impl Scheduler for EventLoop {
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError> {
        let handle = self.inner.ensure_started()?;
        let task_handle = TaskHandle::new();
        let token = task_handle.token();
        let done = task_handle.completion();
        let loop_id = self.inner.loop_id();
        let group = self.inner.group_id.clone();
        handle.spawn(async move {
            if token.is_cancelled() {
                return;
            }
            run_on_loop(loop_id, &group, task);
            done.store(true, Ordering::Release);
        });
        Ok(Arc::new(task_handle))
    }

    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError> {
        let handle = self.inner.ensure_started()?;
        let task_handle = TaskHandle::new();
        let token = task_handle.token();
        let done = task_handle.completion();
        let loop_id = self.inner.loop_id();
        let group = self.inner.group_id.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            run_on_loop(loop_id, &group, task);
            done.store(true, Ordering::Release);
        });
        Ok(Arc::new(task_handle))
    }

    fn schedule_periodically(
        &self,
        mut task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError> {
        let handle = self.inner.ensure_started()?;
        let period = period.max(Duration::from_millis(1));
        let task_handle = TaskHandle::new();
        let token = task_handle.token();
        let done = task_handle.completion();
        let loop_id = self.inner.loop_id();
        let group = self.inner.group_id.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(initial_delay) => {}
            }
            // fixed-rate cadence; an overrunning body queues ticks, which
            // Burst then fires back-to-back without compression
            let mut ticks = time::interval_at(time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                if !run_on_loop(loop_id, &group, || task()) {
                    // a panicking firing cancels the periodic task
                    done.store(true, Ordering::Release);
                    return;
                }
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticks.tick() => {}
                }
            }
        });
        Ok(Arc::new(task_handle))
    }

    fn create_worker(&self) -> Arc<dyn Worker> {
        let base: Arc<dyn Worker> = Arc::new(LoopWorker {
            event_loop: self.clone(),
        });
        Arc::new(DerivedWorker::new(base))
    }

    fn dispose(&self) {
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    fn start(&self) {
        match self.inner.ensure_started() {
            Ok(_) | Err(SchedulerError::Disposed) => {}
            Err(error) => {
                tracing::error!(group = self.inner.group_id.as_str(), %error, "event loop warmup failed");
            }
        }
    }
}

/// The loop viewed through the [`Worker`] surface; base of the workers
/// handed out by [`Scheduler::create_worker`].
struct LoopWorker {
    event_loop: EventLoop,
}

impl Worker for LoopWorker {
    fn schedule(&self, task: Task) -> Result<DisposableRef, SchedulerError> {
        Scheduler::schedule(&self.event_loop, task)
    }

    fn schedule_delayed(&self, task: Task, delay: Duration) -> Result<DisposableRef, SchedulerError> {
        Scheduler::schedule_delayed(&self.event_loop, task, delay)
    }

    fn schedule_periodically(
        &self,
        task: PeriodicTask,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<DisposableRef, SchedulerError> {
        Scheduler::schedule_periodically(&self.event_loop, task, initial_delay, period)
    }

    fn dispose(&self) {
        Scheduler::dispose(&self.event_loop);
    }

    fn is_disposed(&self) -> bool {
        Scheduler::is_disposed(&self.event_loop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::disposable::Disposable;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    #[test]
    fn test_task_runs_on_named_loop_thread() {
        let event_loop = EventLoop::new("grp");
        let (tx, rx) = mpsc::channel();
        event_loop
            .schedule(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                tx.send(name).unwrap();
            }))
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(
            name.starts_with("reactive-kafka-grp-"),
            "unexpected thread name: {name}"
        );
        let suffix: u64 = name.rsplit('-').next().unwrap().parse().unwrap();
        assert!(suffix >= 1);
        assert_eq!(name, event_loop.thread_name());
        event_loop.dispose();
    }

    #[test]
    fn test_all_tasks_share_one_thread() {
        let event_loop = EventLoop::new("affinity");
        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            let tx = tx.clone();
            event_loop
                .schedule(Box::new(move || {
                    tx.send(thread::current().id()).unwrap();
                }))
                .unwrap();
        }
        drop(tx);

        let ids: Vec<_> = rx.iter().take(4).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|id| *id == ids[0]));
        event_loop.dispose();
    }

    #[test]
    fn test_thread_name_counter_increases_in_creation_order() {
        let first = EventLoop::new("g1");
        let second = EventLoop::new("g2");

        let suffix = |event_loop: &EventLoop| -> u64 {
            event_loop
                .thread_name()
                .rsplit('-')
                .next()
                .unwrap()
                .parse()
                .unwrap()
        };
        assert!(suffix(&second) > suffix(&first));

        // the names are what the spawned threads actually carry
        let (tx, rx) = mpsc::channel();
        second
            .schedule(Box::new(move || {
                tx.send(thread::current().name().map(str::to_owned)).unwrap();
            }))
            .unwrap();
        let observed = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(observed, second.thread_name());

        first.dispose();
        second.dispose();
    }

    #[test]
    fn test_submission_fifo_order() {
        let event_loop = EventLoop::new("fifo");
        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();

        let first = Arc::clone(&order);
        event_loop
            .schedule(Box::new(move || {
                thread::sleep(Duration::from_millis(20));
                first.lock().unwrap().push(1);
            }))
            .unwrap();
        let second = Arc::clone(&order);
        event_loop
            .schedule(Box::new(move || {
                second.lock().unwrap().push(2);
                tx.send(()).unwrap();
            }))
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
        event_loop.dispose();
    }

    #[test]
    fn test_on_loop_detection() {
        let event_loop = EventLoop::new("detect");
        let other = EventLoop::new("detect-other");
        assert!(!event_loop.is_current_thread_on_loop());

        let (tx, rx) = mpsc::channel();
        let own = event_loop.clone();
        let foreign = other.clone();
        event_loop
            .schedule(Box::new(move || {
                tx.send((
                    own.is_current_thread_on_loop(),
                    foreign.is_current_thread_on_loop(),
                ))
                .unwrap();
            }))
            .unwrap();

        let (on_own, on_foreign) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(on_own);
        assert!(!on_foreign);
        event_loop.dispose();
        other.dispose();
    }

    #[test]
    fn test_loop_thread_is_marked_non_blocking() {
        let event_loop = EventLoop::new("nb");
        assert!(!is_non_blocking_thread());

        let (tx, rx) = mpsc::channel();
        event_loop
            .schedule(Box::new(move || {
                tx.send(is_non_blocking_thread()).unwrap();
            }))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        event_loop.dispose();
    }

    #[test]
    fn test_cancelled_delayed_task_never_runs() {
        let event_loop = EventLoop::new("cancel");
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = event_loop
            .schedule_delayed(
                Box::new(move || flag.store(true, Ordering::Release)),
                Duration::from_millis(100),
            )
            .unwrap();

        handle.dispose();
        assert!(handle.is_disposed());
        thread::sleep(Duration::from_millis(250));
        assert!(!ran.load(Ordering::Acquire));
        event_loop.dispose();
    }

    #[test]
    fn test_delayed_task_runs_after_deadline() {
        let event_loop = EventLoop::new("delay");
        let (tx, rx) = mpsc::channel();
        let submitted = Instant::now();
        event_loop
            .schedule_delayed(
                Box::new(move || {
                    tx.send(Instant::now()).unwrap();
                }),
                Duration::from_millis(50),
            )
            .unwrap();

        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired.duration_since(submitted) >= Duration::from_millis(50));
        event_loop.dispose();
    }

    #[test]
    fn test_periodic_overrunning_body_never_overlaps() {
        let event_loop = EventLoop::new("periodic");
        let starts = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicBool::new(false));

        let recorded = Arc::clone(&starts);
        let guard = Arc::clone(&in_flight);
        let handle = event_loop
            .schedule_periodically(
                Box::new(move || {
                    assert!(!guard.swap(true, Ordering::AcqRel), "overlapping firing");
                    recorded.lock().unwrap().push(Instant::now());
                    thread::sleep(Duration::from_millis(50));
                    guard.store(false, Ordering::Release);
                }),
                Duration::ZERO,
                Duration::from_millis(10),
            )
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || {
            starts.lock().unwrap().len() >= 3
        }));
        handle.dispose();

        let starts = starts.lock().unwrap();
        for pair in starts.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(50));
        }
        event_loop.dispose();
    }

    #[test]
    fn test_cancelled_periodic_task_stops_firing() {
        let event_loop = EventLoop::new("periodic-cancel");
        let fired = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&fired);
        let handle = event_loop
            .schedule_periodically(
                Box::new(move || {
                    count.fetch_add(1, Ordering::AcqRel);
                }),
                Duration::ZERO,
                Duration::from_millis(10),
            )
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || {
            fired.load(Ordering::Acquire) >= 2
        }));
        handle.dispose();
        let after_dispose = fired.load(Ordering::Acquire);
        thread::sleep(Duration::from_millis(100));
        // at most one firing could have been mid-flight while disposing
        assert!(fired.load(Ordering::Acquire) <= after_dispose + 1);
        event_loop.dispose();
    }

    #[test]
    fn test_panicking_task_is_contained_and_loop_survives() {
        let event_loop = EventLoop::new("panics");
        event_loop
            .schedule(Box::new(|| panic!("boom")))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        event_loop
            .schedule(Box::new(move || tx.send(()).unwrap()))
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        event_loop.dispose();
    }

    #[test]
    fn test_dispose_rejects_new_submissions() {
        let event_loop = EventLoop::new("disposed");
        event_loop.start();
        event_loop.dispose();
        event_loop.dispose();
        assert!(event_loop.is_disposed());

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let result = event_loop.schedule(Box::new(move || flag.store(true, Ordering::Release)));
        assert!(matches!(result, Err(SchedulerError::Disposed)));
        thread::sleep(Duration::from_millis(50));
        assert!(!ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_created_worker_disposal_leaves_loop_running() {
        let event_loop = EventLoop::new("loop-worker");
        let worker = event_loop.create_worker();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        worker
            .schedule_delayed(
                Box::new(move || flag.store(true, Ordering::Release)),
                Duration::from_millis(100),
            )
            .unwrap();
        worker.dispose();
        assert!(worker.is_disposed());

        thread::sleep(Duration::from_millis(250));
        assert!(!ran.load(Ordering::Acquire));
        assert!(!event_loop.is_disposed());

        let (tx, rx) = mpsc::channel();
        event_loop
            .schedule(Box::new(move || tx.send(()).unwrap()))
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        event_loop.dispose();
    }
}
