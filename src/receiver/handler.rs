//! # Exception-handling policy for the receiver pipeline.
//!
//! When an error escapes fetch/commit work, the pipeline consults a
//! [`ReceiverExceptionHandler`] to decide between continuing and failing.
//! The sink-bound variant ([`SinkExceptionHandler`]) is used where the
//! handler is wired as a sink-side callback and acts on the emission surface
//! directly instead of returning a decision.

use crate::error::ReceiverError;
use crate::receiver::sink::RecordSink;

/// Decision returned by a [`ReceiverExceptionHandler`].
///
/// The numeric ids are a stable wire/debug contract and must never be
/// reassigned; the labels are informational and may change.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReceiverExceptionHandlerResponse {
    /// Continue with processing.
    Continue = 0,
    /// Fail the processing and stop.
    Fail = 1,
}

impl ReceiverExceptionHandlerResponse {
    /// The permanent, immutable id of the response.
    ///
    /// # Example
    /// ```
    /// use reactive_kafka::ReceiverExceptionHandlerResponse;
    ///
    /// assert_eq!(ReceiverExceptionHandlerResponse::Continue.id(), 0);
    /// assert_eq!(ReceiverExceptionHandlerResponse::Fail.id(), 1);
    /// ```
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Informational label for debugging.
    pub const fn as_label(self) -> &'static str {
        match self {
            ReceiverExceptionHandlerResponse::Continue => "continue",
            ReceiverExceptionHandlerResponse::Fail => "fail",
        }
    }
}

/// # Policy hook deciding how a receiver error is handled.
///
/// [`Continue`](ReceiverExceptionHandlerResponse::Continue) means log/ignore
/// and keep processing; [`Fail`](ReceiverExceptionHandlerResponse::Fail)
/// means terminate the downstream stream with the error as its terminal
/// event.
pub trait ReceiverExceptionHandler: Send + Sync {
    /// Inspects the error and returns the decision.
    fn handle(&self, error: &ReceiverError) -> ReceiverExceptionHandlerResponse;
}

impl<F> ReceiverExceptionHandler for F
where
    F: Fn(&ReceiverError) -> ReceiverExceptionHandlerResponse + Send + Sync,
{
    fn handle(&self, error: &ReceiverError) -> ReceiverExceptionHandlerResponse {
        self(error)
    }
}

/// # Sink-bound exception handler.
///
/// Variant consulted where the pipeline hands the handler the downstream
/// emission surface; implementations act on the sink (typically by signaling
/// the terminal error) instead of returning a decision.
pub trait SinkExceptionHandler<T>: Send + Sync {
    /// Handles `error`, acting on `sink`.
    fn handle(&self, sink: &dyn RecordSink<T>, error: ReceiverError);
}
