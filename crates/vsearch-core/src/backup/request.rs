use serde::Serialize;
use thiserror::Error;

use crate::retry::TransportError;

/// Errors from starting a backup or restore.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid backup request: {0}")]
    InvalidRequest(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Which collections a backup or restore covers.
/// `include` and `exclude` are mutually exclusive; both empty means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupRequest {
    pub id: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Serialize)]
struct Body<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    include: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    exclude: &'a [String],
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

impl BackupRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn include<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(collections.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn exclude<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(collections.into_iter().map(Into::into));
        self
    }

    /// Backup ids are lowercase `[a-z0-9_-]`, as the server requires.
    pub fn validate(&self) -> Result<(), BackupError> {
        validate_id(&self.id)?;
        if !self.include.is_empty() && !self.exclude.is_empty() {
            return Err(BackupError::InvalidRequest(
                "include and exclude are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON body for `POST /v1/backups/{backend}`.
    pub(super) fn create_body(&self) -> Result<Vec<u8>, BackupError> {
        self.body(Some(&self.id))
    }

    /// JSON body for `POST /v1/backups/{backend}/{id}/restore` (id is in the path).
    pub(super) fn restore_body(&self) -> Result<Vec<u8>, BackupError> {
        self.body(None)
    }

    fn body(&self, id: Option<&str>) -> Result<Vec<u8>, BackupError> {
        serde_json::to_vec(&Body {
            id,
            include: &self.include,
            exclude: &self.exclude,
        })
        .map_err(|e| BackupError::InvalidRequest(e.to_string()))
    }
}

pub(super) fn validate_id(id: &str) -> Result<(), BackupError> {
    if id.is_empty() {
        return Err(BackupError::InvalidRequest("backup id is empty".to_string()));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-'))
    {
        return Err(BackupError::InvalidRequest(format!(
            "backup id {id:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

pub(super) fn validate_backend(backend: &str) -> Result<(), BackupError> {
    if backend.is_empty() || backend.contains('/') {
        return Err(BackupError::InvalidRequest(format!(
            "invalid backend name {backend:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_includes_id_and_scope() {
        let req = BackupRequest::new("nightly-1").include(["Article", "Author"]);
        req.validate().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&req.create_body().unwrap()).unwrap();
        assert_eq!(body["id"], "nightly-1");
        assert_eq!(body["include"], serde_json::json!(["Article", "Author"]));
        assert!(body.get("exclude").is_none());
    }

    #[test]
    fn restore_body_omits_id() {
        let req = BackupRequest::new("nightly-1").exclude(["Scratch"]);
        let body: serde_json::Value = serde_json::from_slice(&req.restore_body().unwrap()).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["exclude"], serde_json::json!(["Scratch"]));
    }

    #[test]
    fn include_and_exclude_conflict() {
        let req = BackupRequest::new("b").include(["A"]).exclude(["B"]);
        assert!(matches!(req.validate(), Err(BackupError::InvalidRequest(_))));
    }

    #[test]
    fn id_charset_enforced() {
        assert!(BackupRequest::new("ok_id-2").validate().is_ok());
        assert!(BackupRequest::new("").validate().is_err());
        assert!(BackupRequest::new("Upper").validate().is_err());
        assert!(BackupRequest::new("a/b").validate().is_err());
    }

    #[test]
    fn backend_name_checked() {
        assert!(validate_backend("filesystem").is_ok());
        assert!(validate_backend("").is_err());
        assert!(validate_backend("s3/x").is_err());
    }
}
