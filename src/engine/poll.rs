// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::time::Duration;

use crate::config::consts::{GRADER_POLL_ATTEMPTS, GRADER_POLL_INTERVAL};
use crate::observability::messages::{engine::*, StructuredLog};

/// Delay between two polling attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `initial * factor^(attempt - 1)`, capped at `max`.
    Exponential {
        initial: Duration,
        factor: u32,
        max: Duration,
    },
}

/// How often, and how patiently, to poll a slow external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(GRADER_POLL_ATTEMPTS, GRADER_POLL_INTERVAL)
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, initial: Duration, factor: u32, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { initial, factor, max },
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, factor, max } => {
                let exponent = attempt.saturating_sub(1);
                let multiplier = factor.checked_pow(exponent).unwrap_or(u32::MAX);
                initial.checked_mul(multiplier).map_or(max, |delay| delay.min(max))
            }
        }
    }
}

/// Outcome of one readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    Ready(T),
    Pending,
}

/// Call `check` until it reports [`PollState::Ready`] or the policy runs out of attempts.
///
/// Returns `Ok(None)` when every attempt came back pending. An error from
/// `check` stops polling immediately.
pub async fn poll_until_ready<T, F, Fut>(target: &str, policy: &RetryPolicy, mut check: F) -> anyhow::Result<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<PollState<T>>>,
{
    for attempt in 1..=policy.max_attempts {
        if let PollState::Ready(value) = check(attempt).await? {
            return Ok(Some(value));
        }
        if attempt < policy.max_attempts {
            let delay = policy.delay_after(attempt);
            PollPending {
                target,
                attempt,
                max_attempts: policy.max_attempts,
                delay,
            }
            .log();
            tokio::time::sleep(delay).await;
        }
    }

    PollExhausted {
        target,
        attempts: policy.max_attempts,
    }
    .log();
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::exponential(10, Duration::from_secs(1), 2, Duration::from_secs(10));
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(5), Duration::from_secs(10));
        assert_eq!(policy.delay_after(64), Duration::from_secs(10));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 18);
        assert_eq!(policy.delay_after(7), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_ready_on_third_attempt() {
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));
        let mut calls = 0;
        let grade = poll_until_ready("grader", &policy, |attempt| {
            calls += 1;
            async move {
                Ok(if attempt == 3 {
                    PollState::Ready("A+")
                } else {
                    PollState::Pending
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(grade, Some("A+"));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhausted_returns_none() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let mut calls = 0;
        let result: Option<()> = poll_until_ready("grader", &policy, |_| {
            calls += 1;
            async { Ok(PollState::Pending) }
        })
        .await
        .unwrap();

        assert_eq!(result, None);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_check_error_stops_polling() {
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));
        let mut calls = 0;
        let err = poll_until_ready::<(), _, _>("grader", &policy, |_| {
            calls += 1;
            async { Err(anyhow::anyhow!("grader returned 500")) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "grader returned 500");
        assert_eq!(calls, 1);
    }
}
