/*!
 * Transactional Retry Helper
 *
 * Retries operations that fail with a transient error (serialization
 * failure or deadlock) up to three times with jittered backoff, per the
 * concurrency model: 10/40/160 ms base delays.
 */

use crate::utils::errors::AppError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

const BASE_DELAYS_MS: [u64; 3] = [10, 40, 160];

/// Run `op` up to 4 times total (1 initial attempt + 3 retries), retrying
/// only on `AppError::TryAgain`. Any other error returns immediately.
/// Exhausting all retries returns the last `TryAgain` error unchanged.
pub async fn retry_transient<F, Fut, T>(mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(AppError::TryAgain(reason)) => {
                if attempt >= BASE_DELAYS_MS.len() {
                    return Err(AppError::TryAgain(reason));
                }
                let base = BASE_DELAYS_MS[attempt];
                let jitter = rand::thread_rng().gen_range(0..=base / 2);
                tracing::warn!(
                    attempt,
                    delay_ms = base + jitter,
                    "retrying after transient conflict: {}",
                    reason
                );
                tokio::time::sleep(Duration::from_millis(base + jitter)).await;
                attempt += 1;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let result = retry_transient(|| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_transient_then_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let result = retry_transient(|| {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::TryAgain("serialization conflict".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_retries() {
        let result = retry_transient(|| async {
            Err::<i32, _>(AppError::TryAgain("serialization conflict".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AppError::TryAgain(_))));
    }

    #[tokio::test]
    async fn non_transient_error_returns_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let result = retry_transient(|| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(AppError::SlotConflict("busy".to_string()))
            }
        })
        .await;
        assert!(matches!(result, Err(AppError::SlotConflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
