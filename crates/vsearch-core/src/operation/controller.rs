//! Poll loop for one started remote operation.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::cancel::CancelSignal;
use super::error::OperationError;
use super::snapshot::{OperationHandle, OperationSnapshot};
use crate::retry::{run_with_retry, RetryPolicy, RetryStop};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Logical state, derived from the stored snapshot and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Polling,
    Succeeded,
    /// Terminal unsuccessful snapshot, or the last wait timed out or
    /// exhausted its status-check retries.
    Failed,
    Canceled,
}

struct State<S> {
    snapshot: S,
    /// Last wait ended without a terminal snapshot (timeout / exhausted retries).
    wait_failed: bool,
}

/// Drives one remote long-running operation to a terminal state.
///
/// The controller spawns nothing: progress happens while a caller awaits
/// `wait_until_done`. `cancel` and `current_status` take `&self` and may be
/// called from another task while a wait is in progress.
pub struct OperationController<H: OperationHandle> {
    handle: H,
    policy: RetryPolicy,
    poll_interval: Duration,
    timeout: Duration,
    state: Mutex<State<H::Snapshot>>,
    cancel: CancelSignal,
    /// Serializes concurrent waiters so polls and retries never overlap.
    poll_lock: tokio::sync::Mutex<()>,
}

impl<H: OperationHandle> OperationController<H> {
    /// `initial` is the snapshot returned when the operation was started.
    pub fn new(handle: H, initial: H::Snapshot) -> Self {
        Self {
            handle,
            policy: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
            state: Mutex::new(State {
                snapshot: initial,
                wait_failed: false,
            }),
            cancel: CancelSignal::new(),
            poll_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn lock_state(&self) -> MutexGuard<'_, State<H::Snapshot>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest known snapshot. No network call.
    pub fn current_status(&self) -> H::Snapshot {
        self.lock_state().snapshot.clone()
    }

    pub fn phase(&self) -> OperationPhase {
        let state = self.lock_state();
        if self.cancel.is_requested() {
            OperationPhase::Canceled
        } else if state.snapshot.is_terminal() {
            if state.snapshot.is_successful() {
                OperationPhase::Succeeded
            } else {
                OperationPhase::Failed
            }
        } else if state.wait_failed {
            OperationPhase::Failed
        } else {
            OperationPhase::Polling
        }
    }

    /// `wait_until_done` with the controller's configured interval and timeout.
    pub async fn wait(&self) -> Result<H::Snapshot, OperationError> {
        self.wait_until_done(self.poll_interval, self.timeout).await
    }

    /// Polls until the snapshot is terminal and returns it (successful or not).
    ///
    /// Fails with `StatusCheckExhausted` when a status check cannot be
    /// completed within the retry policy, `TimedOut` when `timeout` elapses
    /// first, and `Canceled` once `cancel` was called. A timeout leaves the
    /// remote operation running; it is never canceled implicitly.
    pub async fn wait_until_done(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<H::Snapshot, OperationError> {
        let _guard = self.poll_lock.lock().await;
        if let Some(done) = self.settled() {
            return done;
        }

        let deadline = deadline_after(timeout);
        self.lock_state().wait_failed = false;
        loop {
            if !self.pause(poll_interval, deadline).await {
                return Err(self.interrupted(timeout));
            }

            let fetched = run_with_retry(
                &self.policy,
                || self.handle.fetch_status(),
                |delay| self.pause(delay, deadline),
            )
            .await;
            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                Err(RetryStop::Interrupted) => return Err(self.interrupted(timeout)),
                Err(RetryStop::GaveUp { retries, last }) => {
                    tracing::warn!(retries, error = %last, "status check failed");
                    self.lock_state().wait_failed = true;
                    return Err(OperationError::StatusCheckExhausted {
                        retries,
                        source: last,
                    });
                }
            };

            // A terminal snapshot wins even if the deadline passed during the fetch.
            if let Some(done) = self.record(snapshot) {
                return done;
            }
            if Instant::now() >= deadline {
                return Err(self.interrupted(timeout));
            }
        }
    }

    /// Like `wait_until_done`, but an unsuccessful terminal snapshot becomes
    /// `OperationFailed` carrying the server's reason.
    pub async fn wait_for_success(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<H::Snapshot, OperationError> {
        let snapshot = self.wait_until_done(poll_interval, timeout).await?;
        if snapshot.is_successful() {
            Ok(snapshot)
        } else {
            Err(OperationError::OperationFailed {
                reason: snapshot
                    .failure_reason()
                    .unwrap_or("no reason reported")
                    .to_string(),
            })
        }
    }

    /// Requests remote cancellation once. Later calls, and calls after the
    /// operation already finished, return `Ok(())` without a remote request.
    ///
    /// If the request cannot be delivered the error is returned, but the
    /// controller stays canceled.
    pub async fn cancel(&self) -> Result<(), OperationError> {
        {
            let state = self.lock_state();
            if state.snapshot.is_terminal() {
                tracing::debug!("operation already finished, cancel ignored");
                return Ok(());
            }
            if !self.cancel.request() {
                return Ok(());
            }
        }
        tracing::info!("requesting remote cancellation");
        self.handle.request_cancel().await.map_err(|e| {
            tracing::warn!(error = %e, "cancel request failed");
            OperationError::CancelRequestFailed(e)
        })
    }

    /// Result for a controller that needs no further polling.
    fn settled(&self) -> Option<Result<H::Snapshot, OperationError>> {
        if self.cancel.is_requested() {
            return Some(Err(OperationError::Canceled));
        }
        let state = self.lock_state();
        state
            .snapshot
            .is_terminal()
            .then(|| Ok(state.snapshot.clone()))
    }

    /// Stores a fetched snapshot unless a terminal one is already stored.
    /// `poll_lock` already keeps a second waiter from getting here after a
    /// terminal snapshot; the check keeps the invariant local to this method.
    fn record(&self, snapshot: H::Snapshot) -> Option<Result<H::Snapshot, OperationError>> {
        let mut state = self.lock_state();
        if !state.snapshot.is_terminal() {
            state.snapshot = snapshot;
        }
        if self.cancel.is_requested() {
            return Some(Err(OperationError::Canceled));
        }
        if state.snapshot.is_terminal() {
            tracing::info!(
                successful = state.snapshot.is_successful(),
                "operation reached terminal state"
            );
            return Some(Ok(state.snapshot.clone()));
        }
        tracing::debug!("operation still running");
        None
    }

    /// Error for a wait cut short by cancel or deadline.
    fn interrupted(&self, timeout: Duration) -> OperationError {
        if self.cancel.is_requested() {
            return OperationError::Canceled;
        }
        tracing::info!(timeout_ms = timeout.as_millis() as u64, "wait timed out");
        self.lock_state().wait_failed = true;
        OperationError::TimedOut { timeout }
    }

    /// Sleeps for `duration`, cut short by cancel or `deadline`. Returns
    /// `true` only if the full duration elapsed before the deadline.
    async fn pause(&self, duration: Duration, deadline: Instant) -> bool {
        if self.cancel.is_requested() {
            return false;
        }
        let wake = Instant::now()
            .checked_add(duration)
            .map_or(deadline, |w| w.min(deadline));
        tokio::select! {
            biased;
            _ = self.cancel.requested() => false,
            _ = tokio::time::sleep_until(wake) => wake < deadline,
        }
    }
}

/// `now + timeout`, saturating far in the future for huge timeouts.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}
