//! Transient-failure categories and the set type a policy enables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cause of a transient failure that a policy may choose to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryCategory {
    /// Deadline exceeded / request timed out.
    Timeout,
    /// Server asked us to slow down (e.g. 429).
    RateLimited,
    /// Server is temporarily unable to handle the request (e.g. 503).
    ServiceUnavailable,
    /// Connection refused, DNS failure, socket error.
    NetworkError,
}

impl RetryCategory {
    pub const ALL: [RetryCategory; 4] = [
        RetryCategory::Timeout,
        RetryCategory::RateLimited,
        RetryCategory::ServiceUnavailable,
        RetryCategory::NetworkError,
    ];

    const fn bit(self) -> u8 {
        match self {
            RetryCategory::Timeout => 1 << 0,
            RetryCategory::RateLimited => 1 << 1,
            RetryCategory::ServiceUnavailable => 1 << 2,
            RetryCategory::NetworkError => 1 << 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RetryCategory::Timeout => "timeout",
            RetryCategory::RateLimited => "rate_limited",
            RetryCategory::ServiceUnavailable => "service_unavailable",
            RetryCategory::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of enabled retry categories (bitset).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryCategories(u8);

impl RetryCategories {
    pub const NONE: RetryCategories = RetryCategories(0);
    pub const ALL: RetryCategories = RetryCategories(
        RetryCategory::Timeout.bit()
            | RetryCategory::RateLimited.bit()
            | RetryCategory::ServiceUnavailable.bit()
            | RetryCategory::NetworkError.bit(),
    );

    pub const fn only(category: RetryCategory) -> Self {
        RetryCategories(category.bit())
    }

    #[must_use]
    pub const fn with(self, category: RetryCategory) -> Self {
        RetryCategories(self.0 | category.bit())
    }

    #[must_use]
    pub const fn without(self, category: RetryCategory) -> Self {
        RetryCategories(self.0 & !category.bit())
    }

    pub const fn contains(self, category: RetryCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = RetryCategory> {
        RetryCategory::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl FromIterator<RetryCategory> for RetryCategories {
    fn from_iter<I: IntoIterator<Item = RetryCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RetryCategories::NONE, RetryCategories::with)
    }
}

impl fmt::Debug for RetryCategories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
