//! Backup and restore through the server's REST API.
//!
//! `BackupClient` issues the HTTP calls (libcurl, blocking under
//! `spawn_blocking`); `BackupOperation` adapts one started backup or restore
//! to `OperationHandle` so an `OperationController` can poll it.

mod client;
mod model;
mod operation;
mod request;

pub use client::BackupClient;
pub use model::{BackupSnapshot, BackupStatus};
pub use operation::{BackupKind, BackupOperation};
pub use request::{BackupError, BackupRequest};
