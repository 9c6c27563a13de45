//! Exponential-backoff retry for transient provider failures.
//!
//! Backoff schedule: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5).

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

/// Outcome of one attempt inside [`retry_with_backoff`].
pub enum Attempt<T> {
    /// The operation succeeded.
    Done(T),
    /// Transient failure, worth retrying after backoff.
    Retry(anyhow::Error),
}

/// Run `op` until it completes, returns a permanent error, or exhausts
/// `max_retries` transient failures.
///
/// A permanent failure is signalled by returning `Err` from `op`; a
/// transient one by `Ok(Attempt::Retry(_))`.
pub async fn retry_with_backoff<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>>>,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        match op().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("retries exhausted")))
}
