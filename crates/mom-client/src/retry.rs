//! Bounded per-chunk retry with linear backoff

use crate::{ClientError, Config, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Retry settings for one chunk
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,
    /// The n-th retry waits `n * base_delay`
    pub base_delay: Duration,
    /// Retry server-reported application errors
    pub retry_application_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_base_delay,
            retry_application_errors: config.retry_application_errors,
        }
    }

    /// Delay after `failures` failed attempts: 1x, 2x, 3x the base delay
    pub fn backoff(&self, failures: u32) -> Duration {
        self.base_delay * failures
    }

    fn should_retry(&self, err: &ClientError) -> bool {
        match err {
            ClientError::Application(_) => self.retry_application_errors,
            other => other.is_retryable(),
        }
    }

    /// Run `op` until it succeeds, the budget is spent, or `cancel` fires.
    ///
    /// `op` receives the 1-based attempt number. Exhaustion (or a
    /// non-retryable failure) is reported as [`ClientError::ChunkFailed`]
    /// carrying `chunk_index` and the last underlying error.
    pub async fn run<T, F, Fut>(
        &self,
        chunk_index: usize,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = 0u32;

        loop {
            let attempt = failures + 1;
            // Dropping the request future aborts it
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled { chunk_index }),
                res = op(attempt) => res,
            };

            let err = match outcome {
                Ok(value) => {
                    if failures > 0 {
                        info!("Chunk {} succeeded on attempt {}", chunk_index, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            failures += 1;
            if failures >= self.max_attempts || !self.should_retry(&err) {
                return Err(ClientError::ChunkFailed {
                    index: chunk_index,
                    attempts: failures,
                    source: Box::new(err),
                });
            }

            let delay = self.backoff(failures);
            warn!(
                "Chunk {} attempt {}/{} failed: {}; retrying in {:?}",
                chunk_index, attempt, self.max_attempts, err, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled { chunk_index }),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_application_errors: true,
        }
    }

    #[test]
    fn test_linear_backoff() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(2));
        assert_eq!(p.backoff(3), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_failures() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = policy()
            .run(7, &CancellationToken::new(), |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(ClientError::Application("busy".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_names_chunk() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = policy()
            .run(5, &CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::protocol(503, "unavailable")) }
            })
            .await;

        match result {
            Err(ClientError::ChunkFailed { index, attempts, source }) => {
                assert_eq!(index, 5);
                assert_eq!(attempts, 3);
                assert!(matches!(*source, ClientError::Protocol { status: 503, .. }));
            }
            other => panic!("Expected ChunkFailed, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_application_errors_can_fail_fast() {
        let mut p = policy();
        p.retry_application_errors = false;
        let calls = AtomicU32::new(0);

        let result: Result<()> = p
            .run(0, &CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::Application("invalid filename".into())) }
            })
            .await;

        assert!(matches!(result, Err(ClientError::ChunkFailed { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result: Result<()> = policy()
            .run(2, &cancel, |_| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    Err(ClientError::Application("busy".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(ClientError::Cancelled { chunk_index: 2 })));
    }
}
