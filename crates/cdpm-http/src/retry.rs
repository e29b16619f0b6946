//! Fixed-delay retry for transient failures.

use std::future::Future;
use std::time::Duration;

use cdpm_core::Result;
use tracing::warn;

/// Retries an operation on connection-level failures.
///
/// Only errors for which [`Error::is_transient`](cdpm_core::Error::is_transient)
/// holds are retried. HTTP error statuses and authentication failures are
/// returned at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// After `max_attempts` consecutive transient failures the last error is
    /// returned unchanged.
    pub async fn run<F, Fut, R>(&self, mut operation: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = self.delay.as_secs_f64(),
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdpm_core::Error;
    use cdpm_core::error::{HttpError, TransportError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn refused() -> Error {
        TransportError::Connection {
            message: "connection refused".into(),
        }
        .into()
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_max_attempts_then_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let err = RetryPolicy::default()
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(refused())
            })
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(matches!(err, Error::Transport(TransportError::Connection { .. })));
        // Two sleeps between three attempts.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failure() {
        let attempts = AtomicU32::new(0);
        let value = RetryPolicy::new(3, Duration::from_secs(1))
            .run(|| async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(refused())
                } else {
                    Ok("ok")
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn http_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let err = RetryPolicy::default()
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Http(HttpError::new(500, Vec::new(), "boom")))
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_retry_runs_once() {
        let attempts = AtomicU32::new(0);
        let _ = RetryPolicy::no_retry()
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(refused())
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
