//! # Example: poll_loop
//!
//! Periodic polling posted to the consumer's event loop, with fetched batches
//! pushed through a `ChannelSink` and drained by the caller.
//!
//! Demonstrates how to:
//! - Create an [`EventLoop`] for a consumer group.
//! - Schedule a fixed-rate poll task that emits record batches downstream.
//! - Drain the stream until its single terminal signal.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► EventLoop::new("orders")
//!   ├─► ChannelSink::new() ──► (sink, rx)
//!   ├─► schedule_periodically(poll, 0ms, 100ms)
//!   │     ├─► poll #1 ──► sink.next(batch)
//!   │     ├─► poll #2 ──► sink.next(batch)
//!   │     ├─► poll #3 ──► sink.next(batch)
//!   │     └─►           sink.complete()
//!   └─► drain rx until the terminal signal
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example poll_loop
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reactive_kafka::{ChannelSink, Disposable, EventLoop, RecordSink, Scheduler, SinkSignal};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. One loop per consumer; every consumer call is posted to it
    let event_loop = EventLoop::new("orders");

    // 2. The downstream boundary the poll task emits into
    let (sink, mut rx) = ChannelSink::<Vec<String>>::new();
    let sink = Arc::new(sink);

    // 3. Fixed-rate poll: fetch a batch, emit it, complete after three polls
    let polls = Arc::new(AtomicU32::new(0));
    let poll_handle = {
        let sink = Arc::clone(&sink);
        let polls = Arc::clone(&polls);
        event_loop.schedule_periodically(
            Box::new(move || {
                let n = polls.fetch_add(1, Ordering::AcqRel) + 1;
                if n > 3 {
                    return;
                }
                println!("[poll] fetch #{n}");
                sink.next(vec![format!("record-{n}-a"), format!("record-{n}-b")]);
                if n == 3 {
                    sink.complete();
                }
            }),
            Duration::ZERO,
            Duration::from_millis(100),
        )?
    };

    // 4. Drain the stream until its terminal signal
    while let Some(signal) = rx.recv().await {
        match signal {
            SinkSignal::Next(batch) => println!("[main] got {batch:?}"),
            SinkSignal::Complete => {
                println!("[main] stream completed");
                break;
            }
            SinkSignal::Error(err) => {
                println!("[main] stream failed: {err}");
                break;
            }
        }
    }

    // 5. Stop polling and release the loop thread
    poll_handle.dispose();
    event_loop.dispose();
    Ok(())
}
