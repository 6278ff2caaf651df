use std::future::Future;
use std::sync::Arc;

use crate::retry::TransportError;

/// Status payload of a remote operation. Terminal and successful are decided
/// by the payload type; the controller never interprets status strings.
pub trait OperationSnapshot {
    /// No further status change is expected.
    fn is_terminal(&self) -> bool;

    /// Only meaningful when `is_terminal()` is true.
    fn is_successful(&self) -> bool;

    /// Server-supplied reason for an unsuccessful terminal state.
    fn failure_reason(&self) -> Option<&str>;
}

/// Transport calls the controller needs for one started operation.
pub trait OperationHandle: Send + Sync {
    type Snapshot: OperationSnapshot + Clone + Send;

    /// Fetch the current status snapshot.
    fn fetch_status(&self) -> impl Future<Output = Result<Self::Snapshot, TransportError>> + Send;

    /// Ask the server to cancel the operation. Never retried by the controller.
    fn request_cancel(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<H: OperationHandle> OperationHandle for Arc<H> {
    type Snapshot = H::Snapshot;

    fn fetch_status(&self) -> impl Future<Output = Result<Self::Snapshot, TransportError>> + Send {
        (**self).fetch_status()
    }

    fn request_cancel(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).request_cancel()
    }
}
