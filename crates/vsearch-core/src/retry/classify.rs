//! Classify transport failures into retry categories.
//!
//! Each failure shape (HTTP status, RPC code, network failure kind) is looked
//! up in a static table. Anything missing from the tables is not retryable.

use super::category::RetryCategory;
use super::error::{NetworkFailure, RpcCode, TransportError};

const HTTP_STATUS_TABLE: &[(u32, RetryCategory)] = &[
    (408, RetryCategory::Timeout),
    (429, RetryCategory::RateLimited),
    (502, RetryCategory::ServiceUnavailable),
    (503, RetryCategory::ServiceUnavailable),
    (504, RetryCategory::Timeout),
];

const RPC_CODE_TABLE: &[(RpcCode, RetryCategory)] = &[
    (RpcCode::DeadlineExceeded, RetryCategory::Timeout),
    (RpcCode::ResourceExhausted, RetryCategory::RateLimited),
    (RpcCode::Unavailable, RetryCategory::ServiceUnavailable),
];

const NETWORK_TABLE: &[(NetworkFailure, Option<RetryCategory>)] = &[
    (NetworkFailure::ConnectionRefused, Some(RetryCategory::NetworkError)),
    (NetworkFailure::DnsResolution, Some(RetryCategory::NetworkError)),
    (NetworkFailure::Socket, Some(RetryCategory::NetworkError)),
    (NetworkFailure::TimedOut, Some(RetryCategory::Timeout)),
    (NetworkFailure::Other, None),
];

fn lookup<K: PartialEq + Copy>(table: &[(K, RetryCategory)], key: K) -> Option<RetryCategory> {
    table.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> Option<RetryCategory> {
    lookup(HTTP_STATUS_TABLE, code)
}

/// Classify an RPC status code.
pub fn classify_rpc_code(code: RpcCode) -> Option<RetryCategory> {
    lookup(RPC_CODE_TABLE, code)
}

/// Classify a network-level failure kind.
pub fn classify_network_failure(kind: NetworkFailure) -> Option<RetryCategory> {
    NETWORK_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, c)| *c)
}

/// Classify a transport error into at most one retry category.
pub fn classify(e: &TransportError) -> Option<RetryCategory> {
    match e {
        TransportError::Status { code, .. } => classify_http_status(*code),
        TransportError::Rpc { code, .. } => classify_rpc_code(*code),
        TransportError::Network { kind, .. } => classify_network_failure(*kind),
        TransportError::InvalidResponse(_) | TransportError::Other(_) => None,
    }
}

/// Map a curl error to a network failure kind.
pub fn network_failure_from_curl(e: &curl::Error) -> NetworkFailure {
    if e.is_operation_timedout() {
        return NetworkFailure::TimedOut;
    }
    if e.is_couldnt_connect() {
        return NetworkFailure::ConnectionRefused;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return NetworkFailure::DnsResolution;
    }
    if e.is_read_error() || e.is_recv_error() || e.is_send_error() || e.is_got_nothing() {
        return NetworkFailure::Socket;
    }
    NetworkFailure::Other
}
