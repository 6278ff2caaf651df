//! Retry loop: run an async call until success or the policy says stop.

use std::future::Future;
use std::time::Duration;

use super::error::TransportError;
use super::policy::{RetryDecision, RetryPolicy};

/// Why `run_with_retry` gave up.
#[derive(Debug)]
pub enum RetryStop {
    /// The last failure was not retryable, or retries ran out.
    GaveUp { retries: u32, last: TransportError },
    /// The backoff wait was interrupted (deadline or cancellation).
    Interrupted,
}

/// Runs `op` until it succeeds or the retry policy says to stop.
///
/// On a retryable failure, awaits `wait(delay)` before trying again; `wait`
/// returns `false` to abandon the loop (e.g. a deadline or cancel fired
/// during the backoff).
pub async fn run_with_retry<T, Op, OpFut, Wait, WaitFut>(
    policy: &RetryPolicy,
    mut op: Op,
    mut wait: Wait,
) -> Result<T, RetryStop>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, TransportError>>,
    Wait: FnMut(Duration) -> WaitFut,
    WaitFut: Future<Output = bool>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e) {
                RetryDecision::NoRetry => {
                    return Err(RetryStop::GaveUp {
                        retries: attempt,
                        last: e,
                    })
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, backing off"
                    );
                    if !wait(delay).await {
                        return Err(RetryStop::Interrupted);
                    }
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{NetworkFailure, RetryCategories};
    use std::cell::RefCell;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_retries,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            RetryCategories::ALL,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn retries_then_succeeds_with_growing_delays() {
        let calls = RefCell::new(0u32);
        let waits = RefCell::new(Vec::new());
        let res = run_with_retry(
            &policy(2),
            || {
                *calls.borrow_mut() += 1;
                let n = *calls.borrow();
                async move {
                    if n < 3 {
                        Err(TransportError::network(NetworkFailure::Socket, "reset"))
                    } else {
                        Ok(n)
                    }
                }
            },
            |d| {
                waits.borrow_mut().push(d);
                async { true }
            },
        )
        .await;
        assert_eq!(res.unwrap(), 3);
        assert_eq!(
            *waits.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = RefCell::new(0u32);
        let res: Result<(), _> = run_with_retry(
            &policy(2),
            || {
                *calls.borrow_mut() += 1;
                async { Err(TransportError::status(503)) }
            },
            |_| async { true },
        )
        .await;
        match res {
            Err(RetryStop::GaveUp { retries, last }) => {
                assert_eq!(retries, 2);
                assert!(matches!(last, TransportError::Status { code: 503, .. }));
            }
            other => panic!("expected GaveUp, got {other:?}"),
        }
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_on_first_attempt() {
        let calls = RefCell::new(0u32);
        let res: Result<(), _> = run_with_retry(
            &policy(5),
            || {
                *calls.borrow_mut() += 1;
                async { Err(TransportError::status(401)) }
            },
            |_| async { true },
        )
        .await;
        assert!(matches!(res, Err(RetryStop::GaveUp { retries: 0, .. })));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn interrupted_wait_stops_loop() {
        let res: Result<(), _> = run_with_retry(
            &policy(5),
            || async { Err(TransportError::status(429)) },
            |_| async { false },
        )
        .await;
        assert!(matches!(res, Err(RetryStop::Interrupted)));
    }
}
