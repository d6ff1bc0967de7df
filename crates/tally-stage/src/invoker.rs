//! Generic retry/fallback wrapper around one semantic-stage call
//!
//! The invoker guarantees the pipeline never aborts on a single stage
//! failure: transient errors are retried with exponential backoff, then
//! routed to a deterministic fallback. Only a failure of the fallback itself
//! escapes this boundary.

use std::future::Future;
use std::time::Duration;

use crate::error::{FallbackError, StageError};

/// Floor for backoff delays; keeps every pause strictly positive
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Retry and backoff configuration for stage calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Total attempts before the fallback fires
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles per attempt
    pub base_delay: Duration,
    /// Upper bound on any single backoff pause
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Create the default policy (3 attempts, 1 s base, 10 s cap)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With total attempt count
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// With initial backoff delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// With backoff cap
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff pause after the given 1-based failed attempt
    ///
    /// Doubles per attempt from `base_delay`, capped at `max_delay`, never
    /// zero even for degenerate configurations.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.max(MIN_DELAY);
        let cap = self.max_delay.max(MIN_DELAY);
        let doublings = attempt.saturating_sub(1).min(32);
        base.saturating_mul(2u32.saturating_pow(doublings)).min(cap)
    }

    /// Attempt count, floored at one
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Tagged result of an invoked stage
///
/// `Degraded` carries both the fallback payload and the classified error
/// that triggered it, so callers keep observability without an error signal
/// on the success path.
#[derive(Debug)]
pub enum StageOutcome<T> {
    /// The stage call succeeded (possibly after retries)
    Completed(T),
    /// Retries were exhausted or a non-transient error occurred; the value
    /// comes from the deterministic fallback
    Degraded {
        /// Fallback payload
        value: T,
        /// The error that routed the call to fallback
        error: StageError,
        /// Attempts made before falling back
        attempts: u32,
    },
}

impl<T> StageOutcome<T> {
    /// Borrow the payload, completed or degraded
    #[must_use]
    pub fn value(&self) -> &T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Consume into the payload, completed or degraded
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Whether the fallback produced this value
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The classified error, when degraded
    #[must_use]
    pub fn degraded_error(&self) -> Option<&StageError> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded { error, .. } => Some(error),
        }
    }
}

/// Retry/fallback wrapper around semantic-stage calls
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInvoker {
    policy: RetryPolicy,
}

impl StageInvoker {
    /// Create an invoker with the given retry policy
    #[inline]
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured retry policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke a stage call without input sanitization
    ///
    /// See [`StageInvoker::invoke_sanitized`] for the full contract.
    pub async fn invoke<I, T, C, Fut, F>(
        &self,
        stage: &str,
        input: I,
        call: C,
        fallback: F,
    ) -> Result<StageOutcome<T>, FallbackError>
    where
        I: Clone,
        C: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
        F: FnOnce(I) -> Result<T, FallbackError>,
    {
        self.invoke_sanitized(stage, input, |input| input, call, fallback)
            .await
    }

    /// Invoke a stage call with retry, backoff, and deterministic fallback
    ///
    /// `sanitize` runs once over a clone of the input and feeds the primary
    /// call (and its retries). The fallback always receives the original,
    /// unsanitized input. Transient errors retry up to the policy's attempt
    /// count with doubling backoff; retries run strictly sequentially. A
    /// non-transient error skips remaining retries. Either way the fallback
    /// result is returned as `Degraded`; only a fallback failure propagates.
    pub async fn invoke_sanitized<I, T, S, C, Fut, F>(
        &self,
        stage: &str,
        input: I,
        sanitize: S,
        call: C,
        fallback: F,
    ) -> Result<StageOutcome<T>, FallbackError>
    where
        I: Clone,
        S: FnOnce(I) -> I,
        C: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
        F: FnOnce(I) -> Result<T, FallbackError>,
    {
        let max_attempts = self.policy.attempts();
        let sanitized = sanitize(input.clone());

        let mut attempts = 0u32;
        let routed: StageError = loop {
            attempts += 1;
            match call(sanitized.clone()).await {
                Ok(value) => {
                    tracing::debug!("stage `{stage}` completed on attempt {attempts}");
                    return Ok(StageOutcome::Completed(value));
                }
                Err(error) if !error.is_transient() => {
                    tracing::warn!(
                        "stage `{stage}` failed with non-transient error ({}): {error}",
                        error.kind()
                    );
                    break error;
                }
                Err(error) if attempts < max_attempts => {
                    let delay = self.policy.delay_for(attempts);
                    tracing::warn!(
                        "stage `{stage}` attempt {attempts}/{max_attempts} failed ({}), retrying in {delay:?}: {error}",
                        error.kind()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    tracing::warn!(
                        "stage `{stage}` exhausted {max_attempts} attempts ({}): {error}",
                        error.kind()
                    );
                    break error;
                }
            }
        };

        tracing::error!(
            "stage `{stage}` falling back after {attempts} attempt(s), error kind {}",
            routed.kind()
        );
        let value = fallback(input)?;
        Ok(StageOutcome::Degraded {
            value,
            error: routed,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(4))
    }

    #[tokio::test]
    async fn success_on_first_attempt_is_completed() {
        let invoker = StageInvoker::new(fast_policy());
        let outcome = invoker
            .invoke(
                "extract",
                "notes".to_string(),
                |input| async move { Ok::<_, StageError>(input.len()) },
                |_| Ok(0),
            )
            .await
            .unwrap();

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_value(), 5);
    }

    #[tokio::test]
    async fn transient_failures_retry_then_succeed() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();

        let invoker = StageInvoker::new(fast_policy());
        let outcome = invoker
            .invoke(
                "extract",
                (),
                move |()| {
                    let calls = counted.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(StageError::RemoteCall("503".into()))
                        } else {
                            Ok("done")
                        }
                    }
                },
                |()| Ok("fallback"),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!outcome.is_degraded());
        assert_eq!(*outcome.value(), "done");
    }

    #[tokio::test]
    async fn exhausted_retries_route_to_fallback_as_degraded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();

        let invoker = StageInvoker::new(fast_policy());
        let outcome = invoker
            .invoke(
                "extract",
                (),
                move |()| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    async { Err::<&str, _>(StageError::Timeout { duration_secs: 1 }) }
                },
                |()| Ok("fallback"),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(outcome.is_degraded());
        assert_eq!(*outcome.value(), "fallback");
        assert_eq!(outcome.degraded_error().unwrap().kind(), "timeout");
    }

    #[tokio::test]
    async fn non_transient_error_skips_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();

        let invoker = StageInvoker::new(fast_policy());
        let outcome = invoker
            .invoke(
                "validate",
                (),
                move |()| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    async { Err::<&str, _>(StageError::Other("backend misconfigured".into())) }
                },
                |()| Ok("fallback"),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn fallback_receives_original_unsanitized_input() {
        let invoker = StageInvoker::new(fast_policy());
        let outcome = invoker
            .invoke_sanitized(
                "extract",
                "  raw   input  ".to_string(),
                |input| input.split_whitespace().collect::<Vec<_>>().join(" "),
                |input| async move {
                    assert_eq!(input, "raw input");
                    Err::<String, _>(StageError::MalformedOutput("not json".into()))
                },
                |input| Ok(input),
            )
            .await
            .unwrap();

        assert_eq!(outcome.into_value(), "  raw   input  ");
    }

    #[tokio::test]
    async fn fallback_failure_propagates_fatally() {
        let invoker = StageInvoker::new(fast_policy());
        let result = invoker
            .invoke(
                "attribute",
                (),
                |()| async { Err::<(), _>(StageError::RemoteCall("down".into())) },
                |()| Err(FallbackError::new("attribute", anyhow::anyhow!("bug"))),
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.stage, "attribute");
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(10));

        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[test]
    fn degenerate_policy_stays_positive() {
        let policy = RetryPolicy::new()
            .with_max_attempts(0)
            .with_base_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO);

        assert_eq!(policy.attempts(), 1);
        assert!(policy.delay_for(1) > Duration::ZERO);
        assert!(policy.delay_for(10) > Duration::ZERO);
    }
}
