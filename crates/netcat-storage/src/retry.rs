//! Write-with-retry policy shared by every backend: up to 15 attempts with
//! uniform random backoff in `[0.1, 10.0]` seconds on a retryable
//! (throttling) error; any other error fails immediately.

use rand::Rng;
use tracing::warn;

use netcat_core::settings::storage_retry;

use crate::error::{Retryable, StorageError};

/// Run `attempt` until it succeeds, exhausts the retry budget, or fails
/// with a non-retryable error.
pub fn write_with_retry<F>(mut attempt: F) -> Result<(), StorageError>
where
    F: FnMut() -> Result<(), StorageError>,
{
    let settings = storage_retry();
    let mut rng = rand::thread_rng();

    for attempt_no in 1..=settings.max_attempts {
        match attempt() {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() => {
                if attempt_no == settings.max_attempts {
                    return Err(StorageError::Throttled {
                        attempts: attempt_no,
                    });
                }
                let (low, high) = settings.backoff_range_secs;
                let backoff = rng.gen_range(low..high);
                warn!(
                    target: "netcat_storage::retry",
                    "write throttled (attempt {}/{}), backing off {:.2}s",
                    attempt_no, settings.max_attempts, backoff
                );
                std::thread::sleep(std::time::Duration::from_secs_f64(backoff));
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("loop always returns before exhausting attempts range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn retries_until_success_within_budget() {
        let calls = AtomicU32::new(0);
        let result = write_with_retry(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(StorageError::Connection(
                    "request rate is too large, throttling".into(),
                ))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn non_retryable_error_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result = write_with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Query("malformed document".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
