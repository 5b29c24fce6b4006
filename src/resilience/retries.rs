//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed gateway call is retried
//! - Execute retries with exponential backoff + jitter
//!
//! # Design Decisions
//! - A backend that answered is never asked again
//! - A call that may have reached the backend is only repeated when the
//!   caller marks it idempotent
//! - Jittered backoff prevents thundering herd

use std::future::Future;

use crate::config::RetryConfig;
use crate::gateway::GatewayError;
use crate::resilience::backoff::delay_for;

/// Run `call` until it succeeds, fails with an error it may not repeat, or
/// the attempt budget from `config` is spent.
pub async fn with_retries<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    idempotent: bool,
    mut call: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_attempts = if config.enabled {
        config.max_attempts.max(1)
    } else {
        1
    };
    let mut attempts = 0;

    loop {
        attempts += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.may_retry(idempotent) && attempts < max_attempts => {
                let delay = delay_for(config, attempts);
                tracing::info!(
                    operation,
                    attempt = attempts,
                    delay = ?delay,
                    error = %err,
                    "Retrying after network error"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
