use std::fmt;

use super::client::BackupClient;
use super::model::BackupSnapshot;
use crate::operation::OperationHandle;
use crate::retry::TransportError;

/// Which status endpoint an operation is polled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Create,
    Restore,
}

impl BackupKind {
    /// Path segments below `/v1/backups`.
    pub(super) fn path<'a>(self, backend: &'a str, id: &'a str) -> Vec<&'a str> {
        match self {
            BackupKind::Create => vec![backend, id],
            BackupKind::Restore => vec![backend, id, "restore"],
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackupKind::Create => "backup",
            BackupKind::Restore => "restore",
        })
    }
}

/// One started backup or restore, polled through `BackupClient`.
#[derive(Debug, Clone)]
pub struct BackupOperation {
    client: BackupClient,
    kind: BackupKind,
    backend: String,
    id: String,
}

impl BackupOperation {
    pub fn new(
        client: BackupClient,
        kind: BackupKind,
        backend: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            kind,
            backend: backend.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> BackupKind {
        self.kind
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl OperationHandle for BackupOperation {
    type Snapshot = BackupSnapshot;

    async fn fetch_status(&self) -> Result<BackupSnapshot, TransportError> {
        tracing::debug!(kind = %self.kind, backend = %self.backend, id = %self.id, "polling status");
        self.client.status(self.kind, &self.backend, &self.id).await
    }

    async fn request_cancel(&self) -> Result<(), TransportError> {
        self.client.cancel(self.kind, &self.backend, &self.id).await
    }
}
