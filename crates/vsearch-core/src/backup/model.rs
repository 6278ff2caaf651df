use serde::{Deserialize, Serialize};
use std::fmt;

use crate::operation::OperationSnapshot;

/// Backup/restore status as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackupStatus {
    Started,
    Transferring,
    Transferred,
    Success,
    Failed,
    Canceling,
    Canceled,
    /// Status string this client does not know. Treated as still running.
    Unknown(String),
}

impl BackupStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BackupStatus::Started => "STARTED",
            BackupStatus::Transferring => "TRANSFERRING",
            BackupStatus::Transferred => "TRANSFERRED",
            BackupStatus::Success => "SUCCESS",
            BackupStatus::Failed => "FAILED",
            BackupStatus::Canceling => "CANCELLING",
            BackupStatus::Canceled => "CANCELED",
            BackupStatus::Unknown(s) => s,
        }
    }

    fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "STARTED" => BackupStatus::Started,
            "TRANSFERRING" => BackupStatus::Transferring,
            "TRANSFERRED" => BackupStatus::Transferred,
            "SUCCESS" => BackupStatus::Success,
            "FAILED" => BackupStatus::Failed,
            "CANCELLING" | "CANCELING" => BackupStatus::Canceling,
            "CANCELED" | "CANCELLED" => BackupStatus::Canceled,
            _ => BackupStatus::Unknown(s.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BackupStatus::Success | BackupStatus::Failed | BackupStatus::Canceled
        )
    }
}

impl From<String> for BackupStatus {
    fn from(s: String) -> Self {
        BackupStatus::parse(&s)
    }
}

impl From<BackupStatus> for String {
    fn from(s: BackupStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status response for a backup or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub id: String,
    #[serde(default)]
    pub backend: String,
    pub status: BackupStatus,
    /// Storage location reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Collections included (only present on create/restore responses).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl OperationSnapshot for BackupSnapshot {
    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn is_successful(&self) -> bool {
        self.status == BackupStatus::Success
    }

    fn failure_reason(&self) -> Option<&str> {
        match (&self.error, &self.status) {
            (Some(e), _) if !e.is_empty() => Some(e),
            (_, BackupStatus::Canceled) => Some("canceled on server"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_response() {
        let json = r#"{"id":"nightly","backend":"filesystem","path":"/var/backups/nightly","status":"TRANSFERRING"}"#;
        let snap: BackupSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.id, "nightly");
        assert_eq!(snap.backend, "filesystem");
        assert_eq!(snap.status, BackupStatus::Transferring);
        assert_eq!(snap.path.as_deref(), Some("/var/backups/nightly"));
        assert!(!snap.is_terminal());
    }

    #[test]
    fn failed_snapshot_carries_reason() {
        let json = r#"{"id":"b1","status":"FAILED","error":"bucket not found"}"#;
        let snap: BackupSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.is_terminal());
        assert!(!snap.is_successful());
        assert_eq!(snap.failure_reason(), Some("bucket not found"));
        assert_eq!(snap.backend, "");
    }

    #[test]
    fn canceled_is_terminal_without_error_text() {
        let json = r#"{"id":"b1","status":"CANCELED","error":""}"#;
        let snap: BackupSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.is_terminal());
        assert_eq!(snap.failure_reason(), Some("canceled on server"));
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let s = BackupStatus::from("PAUSED".to_string());
        assert_eq!(s, BackupStatus::Unknown("PAUSED".to_string()));
        assert!(!s.is_terminal());
        assert_eq!(String::from(s), "PAUSED");
    }

    #[test]
    fn success_round_trips_as_string() {
        let snap = BackupSnapshot {
            id: "b1".into(),
            backend: "s3".into(),
            status: BackupStatus::Success,
            path: None,
            error: None,
            classes: vec!["Article".into()],
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["classes"][0], "Article");
        assert!(json.get("error").is_none());
    }
}
