use std::time::Duration;

use super::category::{RetryCategories, RetryCategory};
use super::classify::classify;
use super::error::{PolicyError, TransportError};

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this failure.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with a delay cap and a set of retryable categories.
///
/// Immutable once built; `Copy` so it can be shared by any number of
/// concurrent operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
    enabled: RetryCategories,
}

impl Default for RetryPolicy {
    /// 3 retries, 100ms initial delay, x2 backoff, 10s cap, all categories.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            enabled: RetryCategories::ALL,
        }
    }
}

impl RetryPolicy {
    /// Builds a policy. `backoff_multiplier` must be finite and >= 1.0 so the
    /// delay sequence never shrinks.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
        max_delay: Duration,
        enabled: RetryCategories,
    ) -> Result<Self, PolicyError> {
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(backoff_multiplier));
        }
        Ok(Self {
            max_retries,
            initial_delay,
            backoff_multiplier,
            max_delay,
            enabled,
        })
    }

    /// A policy that never retries.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            enabled: RetryCategories::NONE,
            ..Self::default()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn enabled_categories(&self) -> RetryCategories {
        self.enabled
    }

    /// True if a failure of `category` should be retried after `attempt`
    /// retries were already performed. `None` (unclassifiable) never retries.
    pub fn should_retry_category(&self, category: Option<RetryCategory>, attempt: u32) -> bool {
        match category {
            Some(c) => attempt < self.max_retries && self.enabled.contains(c),
            None => false,
        }
    }

    /// Classifies `failure` and decides whether to retry it.
    pub fn should_retry(&self, failure: &TransportError, attempt: u32) -> bool {
        self.should_retry_category(classify(failure), attempt)
    }

    /// Backoff before retry number `attempt + 1` (`attempt` is 0-based):
    /// `min(initial_delay * multiplier^attempt, max_delay)`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exp);
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos as u64)
    }

    /// Combined decision for one failed attempt.
    pub fn decide(&self, attempt: u32, failure: &TransportError) -> RetryDecision {
        if self.should_retry(failure, attempt) {
            RetryDecision::RetryAfter(self.calculate_delay(attempt))
        } else {
            RetryDecision::NoRetry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{NetworkFailure, RpcCode};

    fn network_error() -> TransportError {
        TransportError::network(NetworkFailure::ConnectionRefused, "refused")
    }

    #[test]
    fn default_preset() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries(), 3);
        assert_eq!(p.initial_delay(), Duration::from_millis(100));
        assert_eq!(p.backoff_multiplier(), 2.0);
        assert_eq!(p.max_delay(), Duration::from_secs(10));
        assert_eq!(p.enabled_categories(), RetryCategories::ALL);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let p = RetryPolicy::new(
            20,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            RetryCategories::ALL,
        )
        .unwrap();
        assert_eq!(p.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(p.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(p.calculate_delay(2), Duration::from_millis(400));
        assert_eq!(p.calculate_delay(3), Duration::from_millis(800));
        assert_eq!(p.calculate_delay(4), Duration::from_secs(1));
        assert_eq!(p.calculate_delay(u32::MAX), Duration::from_secs(1));

        let mut prev = Duration::ZERO;
        for attempt in 0..p.max_retries() {
            let d = p.calculate_delay(attempt);
            assert!(d <= p.max_delay());
            assert!(d >= prev);
            prev = d;
        }
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let p = RetryPolicy::new(
            5,
            Duration::from_millis(250),
            1.0,
            Duration::from_secs(10),
            RetryCategories::ALL,
        )
        .unwrap();
        assert_eq!(p.calculate_delay(0), p.calculate_delay(4));
    }

    #[test]
    fn rejects_shrinking_multiplier() {
        let err = RetryPolicy::new(3, Duration::ZERO, 0.5, Duration::ZERO, RetryCategories::ALL)
            .unwrap_err();
        assert_eq!(err, PolicyError::InvalidMultiplier(0.5));
        assert!(RetryPolicy::new(3, Duration::ZERO, f64::NAN, Duration::ZERO, RetryCategories::ALL)
            .is_err());
    }

    #[test]
    fn respects_max_retries() {
        let p = RetryPolicy::default();
        assert!(p.should_retry(&network_error(), 0));
        assert!(p.should_retry(&network_error(), 2));
        assert!(!p.should_retry(&network_error(), 3));
        assert!(!p.should_retry(&network_error(), 100));
        assert_eq!(p.decide(3, &network_error()), RetryDecision::NoRetry);
        assert_eq!(
            p.decide(1, &network_error()),
            RetryDecision::RetryAfter(Duration::from_millis(200))
        );
    }

    #[test]
    fn unclassifiable_never_retried() {
        let p = RetryPolicy::default();
        assert!(!p.should_retry(&TransportError::status(404), 0));
        assert!(!p.should_retry(&TransportError::InvalidResponse("bad json".into()), 0));
    }

    #[test]
    fn zero_retries_never_retries_any_category() {
        let p = RetryPolicy::new(
            0,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            RetryCategories::ALL,
        )
        .unwrap();
        let failures = [
            TransportError::status(429),
            TransportError::status(503),
            TransportError::Rpc {
                code: RpcCode::DeadlineExceeded,
                message: String::new(),
            },
            network_error(),
        ];
        for f in &failures {
            assert!(!p.should_retry(f, 0), "{f} should not be retried");
        }
        let none = RetryPolicy::no_retries();
        assert!(!none.should_retry(&network_error(), 0));
    }

    #[test]
    fn disabled_category_not_retried() {
        let p = RetryPolicy::new(
            3,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            RetryCategories::only(RetryCategory::NetworkError),
        )
        .unwrap();
        assert!(p.should_retry(&network_error(), 0));
        assert!(!p.should_retry(&TransportError::status(429), 0));
        assert!(!p.should_retry(&TransportError::status(503), 0));
    }
}
