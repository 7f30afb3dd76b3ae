//! Fleet Runner: fan out a per-device task across the selected inventory,
//! bounded by `MAX_WORKERS`, and aggregate success/failure.
//!
//! Concurrency is deliberately `std::thread` + the ported `TimeoutSemaphore`
//! rather than the teacher's `ParallelExecutionManager` (which wraps
//! blocking device I/O in `tokio::spawn`): the spec requires a
//! blocking-only model (see `settings::single_process_mode` for the
//! sequential debug path), so this runner does not pull tokio into the hot
//! path at all.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::logging::bind_device_span;
use crate::semaphore::TimeoutSemaphore;
use crate::settings::{max_workers, single_process_mode};

/// Outcome of one fleet-wide run: every requested device, partitioned by
/// whether its worker returned success. `successful` and `failed` always
/// partition `requested` by construction (see spec invariant 3) — there is
/// no way to observe a device in both, or neither.
#[derive(Debug, Clone)]
pub struct FleetResult {
    pub requested: Vec<String>,
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

/// Run `task` once per device name in `devices`, concurrently up to
/// `MAX_WORKERS` (or sequentially, on the calling thread, when
/// `single_process_mode` is set). `task` receives the device name and
/// returns `Ok(())` on success; any `Err` marks that device failed and is
/// logged with the device bound into the tracing span.
pub fn run_fleet<F>(devices: &[String], task: F) -> FleetResult
where
    F: Fn(&str) -> Result<(), crate::error::NetcatError> + Send + Sync + 'static,
{
    let requested: Vec<String> = devices.to_vec();

    if single_process_mode() {
        let mut successful = Vec::new();
        let mut failed = Vec::new();
        for device in &requested {
            let span = bind_device_span(device);
            let _guard = span.enter();
            match task(device) {
                Ok(()) => successful.push(device.clone()),
                Err(e) => {
                    error!(target: "fleet_runner", "worker for {} failed: {}", device, e);
                    failed.push(device.clone());
                }
            }
        }
        return FleetResult {
            requested,
            successful,
            failed,
        };
    }

    let semaphore = Arc::new(TimeoutSemaphore::new(max_workers()));
    let task = Arc::new(task);
    let successful = Arc::new(Mutex::new(Vec::new()));
    let failed = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = requested
        .iter()
        .cloned()
        .map(|device| {
            let semaphore = semaphore.clone();
            let task = task.clone();
            let successful = successful.clone();
            let failed = failed.clone();

            thread::spawn(move || {
                let permit = match semaphore.acquire() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(target: "fleet_runner", "could not acquire worker slot for {}: {}", device, e);
                        failed.lock().push(device);
                        return;
                    }
                };

                let span = bind_device_span(&device);
                let _guard = span.enter();

                match task(&device) {
                    Ok(()) => {
                        info!(target: "fleet_runner", "worker for {} completed", device);
                        successful.lock().push(device);
                    }
                    Err(e) => {
                        error!(target: "fleet_runner", "worker for {} failed: {}", device, e);
                        failed.lock().push(device);
                    }
                }

                drop(permit);
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    let successful = Arc::try_unwrap(successful).map(Mutex::into_inner).unwrap_or_default();
    let failed = Arc::try_unwrap(failed).map(Mutex::into_inner).unwrap_or_default();

    FleetResult {
        requested,
        successful,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{set_max_workers, set_single_process_mode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn requested_partitions_into_successful_and_failed() {
        set_single_process_mode(true);
        let devices = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = run_fleet(&devices, |name| {
            if name == "b" {
                Err(crate::error::NetcatError::Busy("simulated".into()))
            } else {
                Ok(())
            }
        });
        assert_eq!(result.requested, devices);
        assert_eq!(result.successful, vec!["a", "c"]);
        assert_eq!(result.failed, vec!["b"]);
        set_single_process_mode(false);
    }

    #[test]
    fn concurrent_mode_runs_every_device_exactly_once() {
        set_max_workers(4);
        let counter = Arc::new(AtomicUsize::new(0));
        let devices: Vec<String> = (0..10).map(|i| format!("dev{i}")).collect();
        let counter_clone = counter.clone();
        let result = run_fleet(&devices, move |_name| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(result.successful.len(), 10);
        assert!(result.failed.is_empty());
    }
}
