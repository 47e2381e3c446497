//! # reactive-kafka
//!
//! **reactive-kafka** is a support layer for a reactive Kafka consumer.
//!
//! It provides the scheduling utilities that serialize every interaction with
//! the non-thread-safe consumer client onto one named event-loop thread, and
//! the receiver-side exception policy that decides whether a pipeline error
//! is suppressed or terminates the downstream stream.
//!
//! ## Architecture
//! ### Overview
//! ```text
//! pipeline threads                        loop thread
//! ┌───────────────┐                       "reactive-kafka-<group>-<N>"
//! │ fetch driver  │─ schedule ──────────► ┌───────────────────────────────┐
//! │ commit hooks  │─ schedule_delayed ──► │ current-thread runtime        │
//! │ poll timer    │─ schedule_period.. ─► │   task │ task │ timer │ task  │
//! └───────────────┘                       └──────────────┬────────────────┘
//!                                                        ▼
//!                                             broker consumer client
//!                                          (single-threaded by contract)
//!
//! receiver error ──► ReceiverExceptionHandler ──► Continue | Fail
//!                         │
//!                         └─ default (LogAndFail): log at error severity,
//!                            then RecordSink::error(e)   (terminal)
//! ```
//!
//! ### Thread affinity
//! The consumer client is not thread-safe, so serialization is implicit:
//! every call to it is posted to one [`EventLoop`]. Tasks dispatched through
//! the loop can detect that they are on it via
//! [`EventLoop::is_current_thread_on_loop`] and skip re-posting (posting from
//! a loop task and waiting on the result would deadlock the loop). Workers
//! derived from a scheduler scope task lifetimes to a disposable view: the
//! view cancels exactly the tasks it scheduled, never its siblings or the
//! scheduler itself.
//!
//! ## Features
//! | Area                 | Description                                                               | Key types / traits                                        |
//! |----------------------|---------------------------------------------------------------------------|-----------------------------------------------------------|
//! | **Event loop**       | One named thread per consumer group; FIFO, delayed and fixed-rate timers. | [`EventLoop`], [`Scheduler`], [`Worker`]                  |
//! | **Worker views**     | Present a shared worker as a scheduler; dispose tasks as a group.         | [`WorkerScheduler`], [`CompositeDisposable`]              |
//! | **Cancellation**     | Idempotent, any-thread handles for scheduled work.                        | [`Disposable`], [`TaskHandle`]                            |
//! | **Exception policy** | Decide between continuing and failing the downstream stream.             | [`ReceiverExceptionHandler`], [`LogAndFailExceptionHandler`] |
//! | **Emission surface** | Push-based downstream boundary with a single terminal signal.            | [`RecordSink`], [`ChannelSink`]                           |
//! | **Errors**           | Typed errors for scheduler misuse and pipeline failures.                 | [`SchedulerError`], [`ReceiverError`]                     |
//!
//! ## Example
//! ```rust
//! use std::sync::mpsc;
//! use reactive_kafka::{EventLoop, Scheduler};
//!
//! // One loop per consumer; the thread is named reactive-kafka-orders-<N>.
//! let event_loop = EventLoop::new("orders");
//!
//! let (tx, rx) = mpsc::channel();
//! let on_loop = event_loop.clone();
//! event_loop
//!     .schedule(Box::new(move || {
//!         // every consumer call happens here, one at a time
//!         tx.send(on_loop.is_current_thread_on_loop()).unwrap();
//!     }))
//!     .unwrap();
//!
//! assert!(rx.recv().unwrap());
//! assert!(!event_loop.is_current_thread_on_loop());
//! event_loop.dispose();
//! ```

mod error;
mod receiver;
mod schedulers;

// ---- Public re-exports ----

pub use error::{ReceiverError, SchedulerError};
pub use receiver::{
    ChannelSink, LogAndFailExceptionHandler, ReceiverExceptionHandler,
    ReceiverExceptionHandlerResponse, RecordSink, SinkExceptionHandler, SinkSignal,
};
pub use schedulers::{
    is_non_blocking_thread, CompositeDisposable, Disposable, DisposableRef, EventLoop,
    PeriodicTask, Scheduler, Task, TaskHandle, Worker, WorkerScheduler,
};
