//! Retry with exponential backoff and jitter

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry a failed call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: usize,
    /// Delay before the first retry, in seconds
    pub initial_interval: f64,
    pub backoff_factor: f64,
    /// Upper bound on a single delay, in seconds
    pub max_interval: f64,
    /// Scale each delay by a random factor in [0.5, 1.5]
    pub jitter: bool,
}

impl RetryPolicy {
    /// ```rust
    /// use tooling::async_utils::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3);
    /// assert_eq!(policy.max_attempts, 3);
    /// ```
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 30.0,
            jitter: true,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self::new(1)
    }

    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after the failed attempt with 0-based index `attempt`
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let base = self.initial_interval * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval).max(0.0);
        let seconds = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..=1.5)
        } else {
            capped
        };
        Duration::from_secs_f64(seconds)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Retry every error until the policy is exhausted
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, operation, |_| true).await
}

/// Retry only errors accepted by `retryable`; others are returned at once.
///
/// The last error is returned when every attempt fails.
pub async fn with_retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation: F,
    retryable: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !retryable(&error) {
                    if attempt > 1 {
                        tracing::warn!(attempts = attempt, error = %error, "giving up after retries");
                    }
                    return Err(error);
                }
                let delay = policy.delay_for(attempt - 1);
                tracing::debug!(attempt, ?delay, error = %error, "attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Heuristic for transport errors that are worth another attempt
///
/// ```rust
/// use tooling::async_utils::is_retryable_error;
///
/// assert!(is_retryable_error("503 Service Unavailable"));
/// assert!(is_retryable_error("429 Too Many Requests"));
/// assert!(!is_retryable_error("401 Unauthorized"));
/// ```
pub fn is_retryable_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "timeout",
        "timed out",
        "connection",
        "rate limit",
        "too many requests",
        "429",
        "500",
        "502",
        "503",
        "504",
        "unavailable",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}
