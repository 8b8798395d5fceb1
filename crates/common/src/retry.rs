//! Bounded retry policy
//!
//! A [`RetryPolicy`] runs a fallible operation up to a fixed number of
//! attempts, retrying only errors accepted by a caller-supplied predicate.
//! Any other error, or the last retryable one, is returned unchanged.

use std::time::Duration;
use tracing::debug;

/// Retry budget and spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one (at least 1)
    max_attempts: u32,
    /// Pause between attempts
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; a zero attempt budget is raised to one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Exactly one attempt, no retries
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Poll every `interval` until roughly `timeout` has elapsed
    ///
    /// The first attempt runs immediately, so a zero timeout means one attempt.
    pub fn polling(timeout: Duration, interval: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let polls = timeout.as_millis().div_ceil(interval_ms);
        let attempts = u32::try_from(polls).unwrap_or(u32::MAX - 1) + 1;
        Self::new(attempts, interval)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, E, F, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && retryable(&e) => {
                    debug!(
                        "Attempt {}/{} failed: {}, retrying",
                        attempt, self.max_attempts, e
                    );
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn is_transient(e: &TestError) -> bool {
        *e == TestError::Transient
    }

    #[test]
    fn test_succeeds_first_try() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let mut calls = 0;
        let result: Result<u32, TestError> = policy.run(
            |attempt| {
                calls += 1;
                Ok(attempt)
            },
            is_transient,
        );
        assert_eq!(result, Ok(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_succeeds_on_last_attempt() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = policy.run(
            |attempt| {
                if attempt < 5 {
                    Err(TestError::Transient)
                } else {
                    Ok(attempt)
                }
            },
            is_transient,
        );
        assert_eq!(result, Ok(5));
    }

    #[test]
    fn test_budget_exhausted_returns_last_error() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), TestError> = policy.run(
            |_| {
                calls += 1;
                Err(TestError::Transient)
            },
            is_transient,
        );
        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_non_retryable_stops_immediately() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), TestError> = policy.run(
            |_| {
                calls += 1;
                Err(TestError::Fatal)
            },
            is_transient,
        );
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(RetryPolicy::single().max_attempts(), 1);
    }

    #[test]
    fn test_polling_budget() {
        let policy = RetryPolicy::polling(Duration::from_secs(1), Duration::from_millis(100));
        assert_eq!(policy.max_attempts(), 11);
        assert_eq!(policy.delay(), Duration::from_millis(100));

        let policy = RetryPolicy::polling(Duration::ZERO, Duration::from_millis(100));
        assert_eq!(policy.max_attempts(), 1);

        let policy = RetryPolicy::polling(Duration::from_millis(250), Duration::from_millis(100));
        assert_eq!(policy.max_attempts(), 4);
    }
}
