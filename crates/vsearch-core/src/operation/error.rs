use std::time::Duration;
use thiserror::Error;

use crate::retry::TransportError;

/// Why waiting on (or canceling) a remote operation did not produce a
/// successful terminal snapshot.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Status check kept failing (or failed with a non-retryable error).
    /// The operation's actual state is unknown.
    #[error("status check failed after {retries} retries: {source}")]
    StatusCheckExhausted {
        retries: u32,
        #[source]
        source: TransportError,
    },
    /// The server reported the operation finished unsuccessfully.
    #[error("operation failed: {reason}")]
    OperationFailed { reason: String },
    /// No terminal snapshot within the wait budget. The operation is still
    /// running remotely.
    #[error("no terminal status after {timeout:?}")]
    TimedOut { timeout: Duration },
    /// Cancellation was requested before a terminal snapshot was observed.
    #[error("operation canceled")]
    Canceled,
    /// The cancel request could not be delivered. Local state is still canceled.
    #[error("cancel request failed: {0}")]
    CancelRequestFailed(#[source] TransportError),
}

impl OperationError {
    /// Network-layer failure (as opposed to a domain outcome).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            OperationError::StatusCheckExhausted { .. } | OperationError::CancelRequestFailed(_)
        )
    }

    /// True when the remote outcome is not known to the caller.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(
            self,
            OperationError::StatusCheckExhausted { .. }
                | OperationError::TimedOut { .. }
                | OperationError::CancelRequestFailed(_)
        )
    }
}
