//! Bounded exponential backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// How many times, and how patiently, to repeat a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total attempts including the first; 0 behaves like 1
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Also retry submits that may have reached the resolver (timeouts,
    /// malformed responses). Off by default: a repeated submit can duplicate.
    pub retry_ambiguous_submits: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            retry_ambiguous_submits: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the `attempt`-th failure (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Successful value plus the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Final error plus the number of attempts made
#[derive(Debug, Clone, PartialEq)]
pub struct Failure<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails terminally, or the policy is exhausted
///
/// `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<Outcome<T>, Failure<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return Ok(Outcome {
                    value,
                    attempts: attempt,
                })
            }
            Err(error) if attempt < max && is_retryable(&error) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = max,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                return Err(Failure {
                    error,
                    attempts: attempt,
                })
            }
        }
    }
}
