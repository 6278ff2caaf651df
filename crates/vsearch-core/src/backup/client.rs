//! REST calls for backup/restore over libcurl.
//!
//! Each call runs a blocking curl Easy handle; the async methods move it onto
//! tokio's blocking pool so the poll loop never blocks a runtime worker.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

use super::model::BackupSnapshot;
use super::operation::{BackupKind, BackupOperation};
use super::request::{validate_backend, validate_id, BackupError, BackupRequest};
use crate::operation::OperationController;
use crate::retry::TransportError;

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        })
    }
}

/// Client for the `/v1/backups` endpoints of one server.
#[derive(Debug, Clone)]
pub struct BackupClient {
    base: Url,
    api_key: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl BackupClient {
    /// `endpoint` is the server base URL, e.g. `http://localhost:8080`.
    pub fn new(endpoint: &str) -> Result<Self, BackupError> {
        let base = Url::parse(endpoint)
            .map_err(|e| BackupError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(BackupError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            base,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Hard limit for a single HTTP request (not for waiting on an operation).
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["v1", "backups"]).extend(segments);
        }
        url
    }

    fn perform(
        &self,
        method: Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError> {
        tracing::debug!(%method, %url, "backup api request");
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;
        match method {
            Method::Get => easy.get(true)?,
            Method::Post => {
                easy.post(true)?;
                easy.post_fields_copy(body.unwrap_or_default())?;
            }
            Method::Delete => easy.custom_request("DELETE")?,
        }

        let mut list = curl::easy::List::new();
        list.append("Accept: application/json")?;
        if body.is_some() {
            list.append("Content-Type: application/json")?;
        }
        if let Some(key) = &self.api_key {
            list.append(&format!("Authorization: Bearer {}", key.trim()))?;
        }
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Status {
                code,
                message: error_message(&response),
            });
        }
        Ok(response)
    }

    /// `POST /v1/backups/{backend}`. Blocking.
    pub fn create_blocking(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<BackupSnapshot, BackupError> {
        validate_backend(backend)?;
        request.validate()?;
        let body = request.create_body()?;
        let bytes = self.perform(Method::Post, &self.url(&[backend]), Some(&body))?;
        Ok(decode(&bytes)?)
    }

    /// `POST /v1/backups/{backend}/{id}/restore`. Blocking.
    pub fn restore_blocking(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<BackupSnapshot, BackupError> {
        validate_backend(backend)?;
        request.validate()?;
        let body = request.restore_body()?;
        let url = self.url(&[backend, &request.id, "restore"]);
        let bytes = self.perform(Method::Post, &url, Some(&body))?;
        Ok(decode(&bytes)?)
    }

    /// `GET` the backup or restore status. Blocking.
    pub fn status_blocking(
        &self,
        kind: BackupKind,
        backend: &str,
        id: &str,
    ) -> Result<BackupSnapshot, TransportError> {
        let bytes = self.perform(Method::Get, &self.url(&kind.path(backend, id)), None)?;
        decode(&bytes)
    }

    /// `DELETE` the backup or restore (server-side cancel). Blocking.
    pub fn cancel_blocking(
        &self,
        kind: BackupKind,
        backend: &str,
        id: &str,
    ) -> Result<(), TransportError> {
        self.perform(Method::Delete, &self.url(&kind.path(backend, id)), None)?;
        Ok(())
    }

    pub async fn create(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<BackupSnapshot, BackupError> {
        let (client, backend, request) = (self.clone(), backend.to_string(), request.clone());
        blocking(move || client.create_blocking(&backend, &request)).await?
    }

    pub async fn restore(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<BackupSnapshot, BackupError> {
        let (client, backend, request) = (self.clone(), backend.to_string(), request.clone());
        blocking(move || client.restore_blocking(&backend, &request)).await?
    }

    pub async fn status(
        &self,
        kind: BackupKind,
        backend: &str,
        id: &str,
    ) -> Result<BackupSnapshot, TransportError> {
        let (client, backend, id) = (self.clone(), backend.to_string(), id.to_string());
        blocking(move || client.status_blocking(kind, &backend, &id)).await?
    }

    pub async fn cancel(
        &self,
        kind: BackupKind,
        backend: &str,
        id: &str,
    ) -> Result<(), TransportError> {
        let (client, backend, id) = (self.clone(), backend.to_string(), id.to_string());
        blocking(move || client.cancel_blocking(kind, &backend, &id)).await?
    }

    /// Starts a backup and returns a controller seeded with the initial status.
    pub async fn start_backup(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<OperationController<BackupOperation>, BackupError> {
        let initial = self.create(backend, request).await?;
        tracing::info!(backend, id = %request.id, status = %initial.status, "backup started");
        let op = BackupOperation::new(self.clone(), BackupKind::Create, backend, &request.id);
        Ok(OperationController::new(op, initial))
    }

    /// Starts a restore and returns a controller seeded with the initial status.
    pub async fn start_restore(
        &self,
        backend: &str,
        request: &BackupRequest,
    ) -> Result<OperationController<BackupOperation>, BackupError> {
        let initial = self.restore(backend, request).await?;
        tracing::info!(backend, id = %request.id, status = %initial.status, "restore started");
        let op = BackupOperation::new(self.clone(), BackupKind::Restore, backend, &request.id);
        Ok(OperationController::new(op, initial))
    }

    /// Controller for an operation started earlier (e.g. by another process).
    /// Fetches the current status once to seed it.
    pub async fn attach(
        &self,
        kind: BackupKind,
        backend: &str,
        id: &str,
    ) -> Result<OperationController<BackupOperation>, BackupError> {
        validate_backend(backend)?;
        validate_id(id)?;
        let initial = self.status(kind, backend, id).await?;
        let op = BackupOperation::new(self.clone(), kind, backend, id);
        Ok(OperationController::new(op, initial))
    }
}

async fn blocking<T, F>(f: F) -> Result<T, TransportError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransportError::Other(format!("request task failed: {e}")))
}

fn decode(body: &[u8]) -> Result<BackupSnapshot, TransportError> {
    serde_json::from_slice(body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

/// Server error text: `{"error":[{"message":...}]}` or the raw body, shortened.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Vec<ErrorItem>,
    }
    #[derive(Deserialize)]
    struct ErrorItem {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        let messages: Vec<String> = parsed.error.into_iter().map(|e| e.message).collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }
    String::from_utf8_lossy(body).trim().chars().take(200).collect()
}
