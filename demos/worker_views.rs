//! # Example: worker_views
//!
//! Two derived views over one shared worker; disposing one view cancels
//! exactly the tasks it scheduled.
//!
//! Demonstrates how to:
//! - Wrap a worker in a [`WorkerScheduler`].
//! - Derive sibling views with [`Scheduler::create_worker`].
//! - Dispose one view as a group without touching the sibling or the base.
//!
//! ## Flow
//! ```text
//! EventLoop ──► create_worker() ──► base worker
//!                                        │
//!                                  WorkerScheduler
//!                                 ┌──────┴───────┐
//!                                 ▼              ▼
//!                             view W1         view W2
//!                           schedule T1     schedule T2
//!                                 │              │
//!                           dispose W1      T2 fires ──► "[t2] ran"
//!                          (T1 cancelled)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example worker_views
//! ```

use std::thread;
use std::time::Duration;

use reactive_kafka::{EventLoop, Scheduler, Worker, WorkerScheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A shared worker, here funneling into a consumer event loop
    let event_loop = EventLoop::new("views");
    let scheduler = WorkerScheduler::new(event_loop.create_worker());

    // 2. Two transient views over the same worker
    let w1 = scheduler.create_worker();
    let w2 = scheduler.create_worker();

    // 3. One delayed task per view
    w1.schedule_delayed(
        Box::new(|| println!("[t1] ran (should not happen)")),
        Duration::from_millis(200),
    )?;
    w2.schedule_delayed(
        Box::new(|| println!("[t2] ran")),
        Duration::from_millis(200),
    )?;

    // 4. Dispose W1 before its task fires; W2 and the base are unaffected
    w1.dispose();
    println!("[main] w1 disposed: {}", w1.is_disposed());
    println!("[main] w2 disposed: {}", w2.is_disposed());

    thread::sleep(Duration::from_millis(400));

    // 5. The scheduler (and the loop behind it) is still alive
    println!("[main] scheduler disposed: {}", scheduler.is_disposed());
    event_loop.dispose();
    Ok(())
}
