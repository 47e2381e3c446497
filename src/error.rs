//! Error types used by the scheduling layer and the receiver pipeline boundary.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`] — errors raised by the scheduling utilities themselves.
//! - [`ReceiverError`] — errors surfaced by the receiver pipeline and routed
//!   through the exception-handler hook.
//!
//! Both types provide `as_label` for logging/metrics; [`ReceiverError`] adds
//! [`ReceiverError::is_retryable`] so policies can distinguish transient
//! failures from terminal ones.

use thiserror::Error;

/// # Errors produced by the scheduling utilities.
///
/// These represent misuse of or failures in the scheduler machinery itself,
/// not failures of the tasks it runs (a panicking task is logged by the loop
/// and never surfaces here).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Submission was attempted after `dispose()`; the task never ran.
    #[error("scheduler disposed")]
    Disposed,

    /// The event-loop thread or its runtime could not be brought up.
    #[error("event loop failed to start: {source}")]
    StartFailed {
        /// Underlying OS / runtime error.
        #[source]
        source: std::io::Error,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use reactive_kafka::SchedulerError;
    ///
    /// assert_eq!(SchedulerError::Disposed.as_label(), "scheduler_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::Disposed => "scheduler_disposed",
            SchedulerError::StartFailed { .. } => "scheduler_start_failed",
        }
    }
}

/// # Errors surfaced by the receiver pipeline.
///
/// The fetch/commit machinery itself lives outside this crate; what crosses
/// the boundary is one of these values, handed to a
/// [`ReceiverExceptionHandler`](crate::ReceiverExceptionHandler) to decide
/// between continuing and failing the downstream stream.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReceiverError {
    /// A record fetch against the broker failed.
    #[error("record fetch failed: {message}")]
    Fetch {
        /// The underlying failure message.
        message: String,
    },

    /// An offset commit failed.
    #[error("offset commit failed: {message}")]
    Commit {
        /// The underlying failure message.
        message: String,
        /// Whether the broker reported the failure as retriable.
        retriable: bool,
    },

    /// A failure inside the receiver itself.
    #[error("receiver error: {message}")]
    Internal {
        /// The underlying failure message.
        message: String,
    },
}

impl ReceiverError {
    /// Wraps a message as an internal receiver failure.
    pub fn internal(message: impl Into<String>) -> Self {
        ReceiverError::Internal {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use reactive_kafka::ReceiverError;
    ///
    /// let err = ReceiverError::Fetch { message: "broker away".into() };
    /// assert_eq!(err.as_label(), "receiver_fetch_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ReceiverError::Fetch { .. } => "receiver_fetch_failed",
            ReceiverError::Commit { .. } => "receiver_commit_failed",
            ReceiverError::Internal { .. } => "receiver_internal",
        }
    }

    /// Indicates whether the failure is safe to retry.
    ///
    /// Fetches are transient by nature; commits carry the broker's own
    /// retriable flag; internal failures are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReceiverError::Fetch { .. } => true,
            ReceiverError::Commit { retriable, .. } => *retriable,
            ReceiverError::Internal { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(SchedulerError::Disposed.as_label(), "scheduler_disposed");
        assert_eq!(ReceiverError::internal("x").as_label(), "receiver_internal");
        assert_eq!(
            ReceiverError::Commit {
                message: "x".into(),
                retriable: true,
            }
            .as_label(),
            "receiver_commit_failed"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(ReceiverError::Fetch { message: "x".into() }.is_retryable());
        assert!(
            ReceiverError::Commit {
                message: "x".into(),
                retriable: true
            }
            .is_retryable()
        );
        assert!(
            !ReceiverError::Commit {
                message: "x".into(),
                retriable: false
            }
            .is_retryable()
        );
        assert!(!ReceiverError::internal("x").is_retryable());
    }
}
