//! Guarded remote calls.
//!
//! Every mutation the engine issues goes through [`guarded_call`], which
//! absorbs failures instead of propagating them: partial replication of a
//! long run beats aborting it over one entity. The only failure acted on
//! is an explicit rate-limit signal, which is honored with a single
//! bounded retry.

use std::future::Future;
use tokio::time::sleep;
use tracing::{error, warn};
use wsmirror_gateway::error::{GatewayError, Result};

/// Execute a remote call, absorbing all failures.
///
/// If the remote reports a rate limit with a retry-after duration, waits
/// exactly that long and retries once; the retry itself gets no further
/// rate-limit handling, so a second limit signal is abandoned like any
/// other failure. Returns `None` when the call was abandoned; the caller
/// moves on to the next entity.
pub async fn guarded_call<T, F, Fut>(label: &str, mut call: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match call().await {
        Ok(value) => Some(value),
        Err(GatewayError::RateLimited { retry_after }) => {
            warn!(
                entity = label,
                wait_secs = retry_after.as_secs_f64(),
                "rate limited, waiting before single retry"
            );
            sleep(retry_after).await;
            match call().await {
                Ok(value) => Some(value),
                Err(e) => {
                    error!(entity = label, cause = %e, "retry failed, abandoning");
                    None
                }
            }
        }
        Err(e) => {
            error!(entity = label, cause = %e, "call failed, abandoning");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    #[tokio::test]
    async fn test_success_passes_through() {
        let result = guarded_call("op", || async { Ok(7u32) }).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_hard_failure_absorbed() {
        let result: Option<u32> = guarded_call("op", || async {
            Err(GatewayError::Forbidden {
                msg: "missing permission".to_string(),
            })
        })
        .await;
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_then_retries_once() {
        let attempts = Cell::new(0u32);
        let started = tokio::time::Instant::now();

        let result = guarded_call("emoji blob", || {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);
            async move {
                if attempt == 1 {
                    Err(GatewayError::RateLimited {
                        retry_after: Duration::from_secs(2),
                    })
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Some(2));
        assert_eq!(attempts.get(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_rate_limit_is_abandoned() {
        let attempts = Cell::new(0u32);

        let result: Option<u32> = guarded_call("role mods", || {
            attempts.set(attempts.get() + 1);
            async {
                Err(GatewayError::RateLimited {
                    retry_after: Duration::from_secs(1),
                })
            }
        })
        .await;

        // No third attempt: retry-on-rate-limit is disabled after the first.
        assert_eq!(result, None);
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_hard_failure_is_abandoned() {
        let attempts = Cell::new(0u32);

        let result: Option<u32> = guarded_call("channel general", || {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);
            async move {
                if attempt == 1 {
                    Err(GatewayError::RateLimited {
                        retry_after: Duration::from_millis(500),
                    })
                } else {
                    Err(GatewayError::Validation {
                        msg: "name too long".to_string(),
                    })
                }
            }
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(attempts.get(), 2);
    }
}
