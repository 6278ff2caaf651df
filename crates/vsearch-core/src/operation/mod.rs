//! Long-running remote operations (backup, restore) driven to completion.
//!
//! An operation is started elsewhere; the `OperationController` takes the
//! initial snapshot and polls the server through an `OperationHandle` until
//! the snapshot is terminal, the wait times out, or the caller cancels.
//! Failed status checks are retried locally per `RetryPolicy`.

mod cancel;
mod controller;
mod error;
mod snapshot;

pub use cancel::CancelSignal;
pub use controller::{
    OperationController, OperationPhase, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use error::OperationError;
pub use snapshot::{OperationHandle, OperationSnapshot};
