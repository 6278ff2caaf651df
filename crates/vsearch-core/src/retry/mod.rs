//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (timeouts, throttling,
//! unavailable services, network failures) and exponential backoff decisions
//! so that the operation controller and any other caller share one policy.

mod category;
mod classify;
mod error;
mod policy;
mod run;

pub use category::{RetryCategories, RetryCategory};
pub use classify::{
    classify, classify_http_status, classify_network_failure, classify_rpc_code,
    network_failure_from_curl,
};
pub use error::{NetworkFailure, PolicyError, RpcCode, TransportError};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryStop};
