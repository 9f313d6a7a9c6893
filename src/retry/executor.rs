// src/retry/executor.rs
use std::fmt;
use std::future::Future;

use metrics::counter;
use tracing::{debug, error, info, warn};

use super::error::Retryable;
use super::policy::{random_jitter, RetryPolicy};

/// Result of a single attempt, already classified.
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    Failure { error: E, retryable: bool },
}

impl<T, E> AttemptOutcome<T, E> {
    fn classify(res: Result<T, E>, classify: impl Fn(&E) -> bool) -> Self {
        match res {
            Ok(v) => Self::Success(v),
            Err(error) => {
                let retryable = classify(&error);
                Self::Failure { error, retryable }
            }
        }
    }
}

/// Runs an async operation sequentially until it succeeds, fails permanently,
/// or exhausts `max_retries + 1` attempts. Holds no state besides its policy,
/// so a single executor can be shared by any number of concurrent callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same backoff curve with a different attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Retry using the error type's own classification.
    pub async fn execute<T, E, F, Fut>(&self, context: &str, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        self.execute_with(context, operation, |e: &E| e.is_retryable())
            .await
    }

    /// Retry with an explicit classifier. The last error is returned unchanged.
    pub async fn execute_with<T, E, F, Fut, C>(
        &self,
        context: &str,
        mut operation: F,
        classifier: C,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let max_retries = self.policy.max_retries;
        let total = max_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            debug!(context, attempt = attempt + 1, total, "attempt starting");
            counter!("retry_attempts_total").increment(1);

            match AttemptOutcome::classify(operation().await, &classifier) {
                AttemptOutcome::Success(value) => {
                    if attempt > 0 {
                        info!(context, attempts = attempt + 1, "succeeded after retries");
                    }
                    return Ok(value);
                }
                AttemptOutcome::Failure {
                    error: err,
                    retryable: false,
                } => {
                    error!(
                        context,
                        attempt = attempt + 1,
                        error = %err,
                        "non-retryable failure"
                    );
                    return Err(err);
                }
                AttemptOutcome::Failure { error: err, .. } if attempt >= max_retries => {
                    error!(
                        context,
                        attempts = attempt + 1,
                        error = %err,
                        "all retry attempts failed"
                    );
                    counter!("retry_exhausted_total").increment(1);
                    return Err(err);
                }
                AttemptOutcome::Failure { error: err, .. } => {
                    let delay = self.policy.delay_for(attempt, random_jitter());
                    warn!(
                        context,
                        attempt = attempt + 1,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, backing off"
                    );
                    counter!("retry_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::error::FetchError;
    use crate::retry::policy::JITTER_CAP_MS;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_factor: 2.0,
        }
    }

    fn unavailable() -> FetchError {
        FetchError::status(503, "Service Unavailable")
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let exec = RetryExecutor::new(fast_policy(3));

        let out = exec
            .execute("first", move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FetchError>(42) }
            })
            .await;

        assert_eq!(out, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn always_retryable_failure_runs_max_retries_plus_one() {
        for max in [0u32, 1, 2, 4] {
            let calls = Arc::new(AtomicU32::new(0));
            let c = calls.clone();
            let exec = RetryExecutor::new(fast_policy(max));

            let out: Result<(), _> = exec
                .execute("exhaust", move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Err(unavailable()) }
                })
                .await;

            assert_eq!(out, Err(unavailable()));
            assert_eq!(calls.load(Ordering::SeqCst), max + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_transient_failure_then_success_runs_twice() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let exec = RetryExecutor::new(fast_policy(3));

        let out = exec
            .execute("flaky", move || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(FetchError::network(
                            crate::retry::NetworkErrorKind::ConnectionReset,
                            "reset by peer",
                        ))
                    } else {
                        Ok("payload")
                    }
                }
            })
            .await;

        assert_eq!(out, Ok("payload"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let exec = RetryExecutor::new(fast_policy(5));

        let out: Result<(), _> = exec
            .execute("permanent", move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::status(404, "Not Found")) }
            })
            .await;

        assert_eq!(out, Err(FetchError::status(404, "Not Found")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_classifier_overrides_error_type() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let exec = RetryExecutor::new(fast_policy(2));

        let out: Result<(), String> = exec
            .execute_with(
                "custom",
                move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Err("transient".to_string()) }
                },
                |e: &String| e == "transient",
            )
            .await;

        assert_eq!(out, Err("transient".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_follow_backoff_within_jitter_bound() {
        let policy = fast_policy(4);
        let exec = RetryExecutor::new(policy);
        let stamps: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let s = stamps.clone();

        let _: Result<(), _> = exec
            .execute("timing", move || {
                s.lock().unwrap().push(Instant::now());
                async { Err(unavailable()) }
            })
            .await;

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 5);
        for (k, pair) in stamps.windows(2).enumerate() {
            let gap = pair[1] - pair[0];
            let floor = policy.backoff(k as u32);
            let ceil = Duration::from_millis(policy.max_delay_ms + JITTER_CAP_MS);
            assert!(gap >= floor, "gap {gap:?} below backoff {floor:?} at k={k}");
            assert!(gap <= ceil, "gap {gap:?} above cap {ceil:?} at k={k}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn with_max_retries_keeps_delays() {
        let exec = RetryExecutor::new(fast_policy(9)).with_max_retries(1);
        assert_eq!(exec.policy().max_retries, 1);
        assert_eq!(exec.policy().base_delay_ms, 100);

        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let _: Result<(), _> = exec
            .execute("budget", move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
