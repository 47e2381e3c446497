//! # Default exception policy: log, then fail the stream.
//!
//! [`LogAndFailExceptionHandler`] records the error at error severity and
//! terminates the downstream stream with it. It implements both handler
//! forms: the sink-bound form performs the action directly, so there is one
//! unambiguous failure path; the decision form is equivalent to always
//! returning [`Fail`](ReceiverExceptionHandlerResponse::Fail).

use crate::error::ReceiverError;
use crate::receiver::handler::{
    ReceiverExceptionHandler, ReceiverExceptionHandlerResponse, SinkExceptionHandler,
};
use crate::receiver::sink::RecordSink;

/// Receiver exception handler that logs an error and then fails.
pub struct LogAndFailExceptionHandler;

impl<T> SinkExceptionHandler<T> for LogAndFailExceptionHandler {
    fn handle(&self, sink: &dyn RecordSink<T>, error: ReceiverError) {
        tracing::error!(label = error.as_label(), %error, "receiver exception caught");
        sink.error(error);
    }
}

impl ReceiverExceptionHandler for LogAndFailExceptionHandler {
    fn handle(&self, error: &ReceiverError) -> ReceiverExceptionHandlerResponse {
        tracing::error!(label = error.as_label(), %error, "receiver exception caught");
        ReceiverExceptionHandlerResponse::Fail
    }
}
