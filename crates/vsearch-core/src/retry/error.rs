//! Transport-level failure shapes produced by collaborators.

use std::fmt;
use thiserror::Error;

/// Network-level failure kinds, independent of the client library that hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    ConnectionRefused,
    DnsResolution,
    /// Read/write/reset on an established socket.
    Socket,
    TimedOut,
    Other,
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkFailure::ConnectionRefused => "connection refused",
            NetworkFailure::DnsResolution => "name resolution failed",
            NetworkFailure::Socket => "socket error",
            NetworkFailure::TimedOut => "timed out",
            NetworkFailure::Other => "network failure",
        };
        f.write_str(s)
    }
}

/// Protocol-agnostic RPC status codes (gRPC numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    Unimplemented,
    Internal,
    Unavailable,
    Unauthenticated,
}

impl RpcCode {
    /// Maps a numeric gRPC status code. `0` (OK) and out-of-range values map to `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let c = match code {
            1 => RpcCode::Cancelled,
            2 => RpcCode::Unknown,
            3 => RpcCode::InvalidArgument,
            4 => RpcCode::DeadlineExceeded,
            5 => RpcCode::NotFound,
            6 => RpcCode::AlreadyExists,
            7 => RpcCode::PermissionDenied,
            8 => RpcCode::ResourceExhausted,
            9 => RpcCode::FailedPrecondition,
            10 => RpcCode::Aborted,
            12 => RpcCode::Unimplemented,
            13 => RpcCode::Internal,
            14 => RpcCode::Unavailable,
            16 => RpcCode::Unauthenticated,
            _ => return None,
        };
        Some(c)
    }
}

/// Error returned by a single collaborator call (status fetch, cancel request).
/// Classified into a `RetryCategory` before any retry decision.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP response had a non-2xx status.
    #[error("HTTP {code}: {message}")]
    Status { code: u32, message: String },
    /// RPC call returned a non-OK status.
    #[error("rpc status {code:?}: {message}")]
    Rpc { code: RpcCode, message: String },
    /// The request never got a response (connect, DNS, socket, timeout).
    #[error("{kind}: {message}")]
    Network { kind: NetworkFailure, message: String },
    /// A response arrived but could not be decoded. Not retried.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Anything else (e.g. a worker task that panicked). Not retried.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn status(code: u32) -> Self {
        TransportError::Status {
            code,
            message: String::new(),
        }
    }

    pub fn network(kind: NetworkFailure, message: impl Into<String>) -> Self {
        TransportError::Network {
            kind,
            message: message.into(),
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Network {
            kind: super::classify::network_failure_from_curl(&e),
            message: e.to_string(),
        }
    }
}

/// Rejected retry policy parameters.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("backoff multiplier must be a finite value >= 1.0, got {0}")]
    InvalidMultiplier(f64),
    #[error("invalid {field} delay: {value}s")]
    InvalidDelay { field: &'static str, value: f64 },
}
