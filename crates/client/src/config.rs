//! Client configuration.

use crate::error::ClientError;
use std::time::Duration;

/// Attempt limits and pacing for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,

    /// The wait after attempt `n` is `backoff_step * n`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(60),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following attempt `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Configuration for one remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL requests are posted to.
    pub endpoint: String,

    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.retry.attempt_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.retry.backoff_step = step;
        self
    }

    /// Check that the config can be used to build a client.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.attempt_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "attempt timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_after(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_after(3), Duration::from_secs(3));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("http://localhost:8000/simulate")
            .validate()
            .is_ok());
        assert!(ClientConfig::new("localhost:8000").validate().is_err());
        assert!(ClientConfig::new("https://sim.example")
            .with_max_attempts(0)
            .validate()
            .is_err());
    }
}
