//! Receiver-side policy surface: the emission boundary and exception
//! handling.
//!
//! The fetch/commit pipeline lives outside this crate; what it needs from
//! here is a [`RecordSink`] to emit into and a policy hook to consult when
//! an error escapes its work.
//!
//! ## Contents
//! - [`RecordSink`], [`SinkSignal`], [`ChannelSink`] — emission surface
//! - [`ReceiverExceptionHandler`], [`SinkExceptionHandler`],
//!   [`ReceiverExceptionHandlerResponse`] — the policy contract
//! - [`LogAndFailExceptionHandler`] — default policy: log, then terminate
//!   the stream with the error

mod handler;
mod log_and_fail;
mod sink;

pub use handler::{
    ReceiverExceptionHandler, ReceiverExceptionHandlerResponse, SinkExceptionHandler,
};
pub use log_and_fail::LogAndFailExceptionHandler;
pub use sink::{ChannelSink, RecordSink, SinkSignal};
