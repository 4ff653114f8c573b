use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SubscribeError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// How hard to try before giving up.
///
/// With the defaults, a call makes up to 5 attempts, sleeping 1, 2, 4 and 8
/// seconds in between (15 s in total; there is no sleep after the last
/// attempt). There is no jitter and no cap on the delay other than the
/// attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 0 is treated as 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubled after each subsequent one
    pub base_backoff: Duration,
    /// Upper bound on the whole call, sleeps included
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            call_timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Sleep after the failed attempt `attempt` (0-based): `base * 2^attempt`
    pub fn backoff(
        &self,
        attempt: u32,
    ) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or runs
    /// out of attempts, in which case the last error is returned.
    ///
    /// `op` receives the 0-based attempt number. Attempts never overlap: each
    /// one, and the sleep after it, completes before the next begins.
    /// Cancelling `cancel` (or reaching `call_timeout`) interrupts both
    /// in-flight attempts and sleeps.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, SubscribeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, SubscribeError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let deadline = self.call_timeout.map(|t| Instant::now() + t);

        if cancel.is_cancelled() {
            return Err(SubscribeError::Cancelled);
        }

        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                // cancellation wins ties
                biased;
                _ = cancel.cancelled() => return Err(SubscribeError::Cancelled),
                _ = deadline_elapsed(deadline) => return Err(SubscribeError::DeadlineExceeded),
                outcome = op(attempt) => outcome,
            };

            let e = match outcome {
                Ok(v) => {
                    tracing::debug!(attempt = attempt + 1, "attempt succeeded");
                    return Ok(v);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt + 1 >= max_attempts {
                tracing::error!(
                    e.cause_chain=?e,
                    "giving up after {max_attempts} attempts"
                );
                return Err(e);
            }

            let delay = self.backoff(attempt);
            tracing::warn!(
                e.cause_chain=?e,
                "attempt {}/{max_attempts} failed, retrying in {delay:?}",
                attempt + 1
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SubscribeError::Cancelled),
                _ = deadline_elapsed(deadline) => return Err(SubscribeError::DeadlineExceeded),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

/// Never resolves when there is no deadline.
async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
