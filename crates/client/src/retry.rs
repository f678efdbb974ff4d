//! Bounded, cancellable retries.

use crate::config::RetryPolicy;
use crate::error::ClientError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Each attempt is bounded by `policy.attempt_timeout`. Between attempts the
/// call sleeps `backoff_step * attempt`. Cancelling `cancel` aborts the
/// current attempt or sleep immediately with [`ClientError::Cancelled`].
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    mut op: F,
) -> Result<T, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=policy.max_attempts {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = tokio::time::timeout(policy.attempt_timeout, op(attempt)) => {
                result.unwrap_or(Err(ClientError::Timeout(policy.attempt_timeout)))
            }
        };

        match outcome {
            Ok(value) => {
                info!(operation, attempt, "Request succeeded");
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                last_error = e.to_string();
                if attempt == policy.max_attempts {
                    warn!(operation, attempt, error = %e, "Final attempt failed");
                    break;
                }
                let backoff = policy.backoff_after(attempt);
                warn!(operation, attempt, error = %e, ?backoff, "Attempt failed, retrying");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    Err(ClientError::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}
