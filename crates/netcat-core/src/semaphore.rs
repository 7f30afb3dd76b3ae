//! A counting semaphore with timeout support, used to bound the Fleet
//! Runner's worker pool at `MAX_WORKERS`.
//!
//! Ported near-verbatim from the teacher's `semaphore.rs` (Mutex+Condvar
//! based, `SemaphorePermit` releases on `Drop`), swapping `log` for
//! `tracing` to match the rest of this crate.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum SemaphoreError {
    #[error("timed out waiting for semaphore permit")]
    Timeout,

    #[error("semaphore is closed")]
    Closed,

    #[error("failed to acquire lock: {0}")]
    LockError(String),
}

/// A counting semaphore allowing a maximum number of permits to be held
/// concurrently, with optional timeout-based acquisition.
pub struct TimeoutSemaphore {
    state: Arc<(Mutex<SemaphoreState>, Condvar)>,
}

struct SemaphoreState {
    available: usize,
    max_permits: usize,
    closed: bool,
}

/// A permit acquired from the semaphore; returned to the pool on `Drop`.
pub struct SemaphorePermit {
    semaphore: Arc<(Mutex<SemaphoreState>, Condvar)>,
}

impl Drop for SemaphorePermit {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.semaphore;
        if let Ok(mut state) = lock.lock() {
            if !state.closed {
                state.available += 1;
                trace!("permit released, available: {}/{}", state.available, state.max_permits);
                cvar.notify_one();
            }
        }
    }
}

impl TimeoutSemaphore {
    pub fn new(max_permits: usize) -> Self {
        debug!("creating semaphore with max_permits={}", max_permits);
        let state = SemaphoreState {
            available: max_permits,
            max_permits,
            closed: false,
        };

        Self {
            state: Arc::new((Mutex::new(state), Condvar::new())),
        }
    }

    pub fn try_acquire(&self) -> Result<SemaphorePermit, SemaphoreError> {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;

        if state.closed {
            return Err(SemaphoreError::Closed);
        }

        if state.available > 0 {
            state.available -= 1;
            trace!("permit acquired immediately, remaining: {}/{}", state.available, state.max_permits);
            Ok(SemaphorePermit {
                semaphore: self.state.clone(),
            })
        } else {
            Err(SemaphoreError::Timeout)
        }
    }

    pub fn acquire(&self) -> Result<SemaphorePermit, SemaphoreError> {
        self.acquire_timeout(None)
    }

    pub fn acquire_timeout(&self, timeout: Option<Duration>) -> Result<SemaphorePermit, SemaphoreError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;

        if state.closed {
            return Err(SemaphoreError::Closed);
        }

        if state.available > 0 {
            state.available -= 1;
            trace!("permit acquired immediately, remaining: {}/{}", state.available, state.max_permits);
            return Ok(SemaphorePermit {
                semaphore: self.state.clone(),
            });
        }

        if timeout.is_none() {
            debug!("waiting for permit (indefinitely)");
            state = cvar
                .wait_while(state, |s| s.available == 0 && !s.closed)
                .map_err(|e| SemaphoreError::LockError(e.to_string()))?;

            if state.closed {
                return Err(SemaphoreError::Closed);
            }

            state.available -= 1;
            trace!("permit acquired after waiting, remaining: {}/{}", state.available, state.max_permits);
            return Ok(SemaphorePermit {
                semaphore: self.state.clone(),
            });
        }

        let timeout = timeout.unwrap();
        let start = Instant::now();
        debug!("waiting for permit with timeout: {:?}", timeout);

        loop {
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!("timeout waiting for semaphore permit");
                return Err(SemaphoreError::Timeout);
            }

            let remaining = timeout - elapsed;
            let result = cvar
                .wait_timeout_while(state, remaining, |s| s.available == 0 && !s.closed)
                .map_err(|e| SemaphoreError::LockError(e.to_string()))?;

            state = result.0;
            let timed_out = result.1.timed_out();

            if state.closed {
                return Err(SemaphoreError::Closed);
            }

            if !timed_out && state.available > 0 {
                state.available -= 1;
                trace!("permit acquired after waiting, remaining: {}/{}", state.available, state.max_permits);
                return Ok(SemaphorePermit {
                    semaphore: self.state.clone(),
                });
            }

            if timed_out {
                warn!("timeout waiting for semaphore permit");
                return Err(SemaphoreError::Timeout);
            }
        }
    }

    pub fn available_permits(&self) -> Result<usize, SemaphoreError> {
        let (lock, _) = &*self.state;
        let state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;
        Ok(state.available)
    }

    pub fn max_permits(&self) -> Result<usize, SemaphoreError> {
        let (lock, _) = &*self.state;
        let state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;
        Ok(state.max_permits)
    }

    pub fn close(&self) {
        let (lock, cvar) = &*self.state;
        if let Ok(mut state) = lock.lock() {
            state.closed = true;
            cvar.notify_all();
        }
    }

    pub fn add_permits(&self, count: usize) -> Result<(), SemaphoreError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;

        if state.closed {
            return Err(SemaphoreError::Closed);
        }

        state.max_permits += count;
        state.available += count;

        debug!("added {} permits, now available: {}/{}", count, state.available, state.max_permits);

        cvar.notify_all();
        Ok(())
    }

    pub fn remove_permits(&self, count: usize) -> Result<(), SemaphoreError> {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().map_err(|e| SemaphoreError::LockError(e.to_string()))?;

        if state.closed {
            return Err(SemaphoreError::Closed);
        }

        let remove = count.min(state.max_permits);
        state.max_permits -= remove;
        state.available = state.available.min(state.max_permits);

        debug!("removed {} permits, now available: {}/{}", remove, state.available, state.max_permits);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_restores_availability() {
        let sem = TimeoutSemaphore::new(2);
        assert_eq!(sem.available_permits().unwrap(), 2);
        let permit = sem.try_acquire().unwrap();
        assert_eq!(sem.available_permits().unwrap(), 1);
        drop(permit);
        assert_eq!(sem.available_permits().unwrap(), 2);
    }

    #[test]
    fn try_acquire_fails_when_exhausted() {
        let sem = TimeoutSemaphore::new(1);
        let _permit = sem.try_acquire().unwrap();
        assert!(matches!(sem.try_acquire(), Err(SemaphoreError::Timeout)));
    }

    #[test]
    fn acquire_timeout_fails_after_deadline() {
        let sem = TimeoutSemaphore::new(1);
        let _permit = sem.try_acquire().unwrap();
        let result = sem.acquire_timeout(Some(Duration::from_millis(20)));
        assert!(matches!(result, Err(SemaphoreError::Timeout)));
    }
}
