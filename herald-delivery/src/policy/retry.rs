//! Retry policy for retryable delivery failures.
//!
//! Rate-limit waits never count as attempts; only transient and
//! unclassified failures do.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts for one item before giving up.
    ///
    /// Default: 5 attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step (in seconds).
    ///
    /// The wait after attempt `n` fails is `n * backoff_step_secs`.
    ///
    /// Default: 3 seconds
    #[serde(default = "defaults::backoff_step_secs")]
    pub backoff_step_secs: u64,

    /// Stop the whole run when an item exhausts its attempts.
    ///
    /// When `false` the item is recorded as failed and the run moves on.
    ///
    /// Default: `false`
    #[serde(default)]
    pub halt_on_failure: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            backoff_step_secs: defaults::backoff_step_secs(),
            halt_on_failure: false,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt follows a failed attempt number `attempt` (1-based).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Wait after attempt number `attempt` (1-based) failed.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_step_secs.saturating_mul(u64::from(attempt)))
    }

    /// Attempts left once attempt number `attempt` has failed
    #[must_use]
    pub const fn remaining_attempts(&self, attempt: u32) -> u32 {
        self.max_attempts.saturating_sub(attempt)
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        5
    }

    pub const fn backoff_step_secs() -> u64 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_step_secs, 3);
        assert!(!policy.halt_on_failure);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
        assert!(!policy.should_retry(6));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(3));
        assert_eq!(policy.backoff(2), Duration::from_secs(6));
        assert_eq!(policy.backoff(4), Duration::from_secs(12));
    }

    #[test]
    fn test_remaining_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.remaining_attempts(0), 5);
        assert_eq!(policy.remaining_attempts(5), 0);
        assert_eq!(policy.remaining_attempts(9), 0);
    }
}
