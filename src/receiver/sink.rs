//! # Emission surface: the downstream side of the record stream.
//!
//! The receiver pipeline pushes fetched record batches, and eventually one
//! terminal signal, through a [`RecordSink`]. [`ChannelSink`] is the
//! channel-backed implementation: a thin wrapper over an unbounded
//! `tokio::sync::mpsc` channel that never blocks the emitting side.
//!
//! ## Rules
//! - **Single terminal**: after `error` or `complete`, every further signal
//!   is dropped.
//! - **Fire-and-forget**: emission after the receiving half is gone is a
//!   no-op; the pipeline does not observe subscriber lifetime.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::error::ReceiverError;

/// Downstream emission surface for fetched records.
///
/// `next` delivers a batch; `error` and `complete` are terminal, after which
/// no further values or signals are produced.
pub trait RecordSink<T>: Send + Sync {
    /// Delivers one batch downstream.
    fn next(&self, batch: T);

    /// Terminates the stream with `error`. Terminal.
    fn error(&self, error: ReceiverError);

    /// Completes the stream. Terminal.
    fn complete(&self);
}

/// Signal observed by the consuming side of a [`ChannelSink`].
#[derive(Debug)]
pub enum SinkSignal<T> {
    /// A batch of records.
    Next(T),
    /// Terminal error; nothing follows.
    Error(ReceiverError),
    /// Terminal completion; nothing follows.
    Complete,
}

/// [`RecordSink`] over an unbounded channel.
///
/// Cheap to share behind an `Arc`; enforces the single-terminal contract on
/// the emitting side so consumers never observe a signal after the terminal
/// one.
pub struct ChannelSink<T> {
    tx: mpsc::UnboundedSender<SinkSignal<T>>,
    terminated: AtomicBool,
}

impl<T: Send> ChannelSink<T> {
    /// Creates the sink and the receiver that observes its signals.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkSignal<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                terminated: AtomicBool::new(false),
            },
            rx,
        )
    }

    fn terminate(&self) -> bool {
        !self.terminated.swap(true, Ordering::AcqRel)
    }
}

impl<T: Send> RecordSink<T> for ChannelSink<T> {
    fn next(&self, batch: T) {
        if self.terminated.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(SinkSignal::Next(batch));
    }

    fn error(&self, error: ReceiverError) {
        if self.terminate() {
            let _ = self.tx.send(SinkSignal::Error(error));
        }
    }

    fn complete(&self) {
        if self.terminate() {
            let _ = self.tx.send(SinkSignal::Complete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_then_complete() {
        let (sink, mut rx) = ChannelSink::new();
        sink.next(vec![1u32, 2]);
        sink.complete();

        assert!(matches!(rx.try_recv(), Ok(SinkSignal::Next(batch)) if batch == vec![1, 2]));
        assert!(matches!(rx.try_recv(), Ok(SinkSignal::Complete)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_signals_after_terminal_are_dropped() {
        let (sink, mut rx) = ChannelSink::new();
        sink.error(ReceiverError::internal("boom"));
        sink.next(vec![1u32]);
        sink.complete();
        sink.error(ReceiverError::internal("again"));

        match rx.try_recv() {
            Ok(SinkSignal::Error(err)) => assert_eq!(err.to_string(), "receiver error: boom"),
            other => panic!("expected terminal error, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emission_after_receiver_dropped_is_noop() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.next(vec![1u32]);
        sink.complete();
    }
}
