//! Assemble the fleet-wide `JobStatus` document from a `FleetResult`.
//!
//! `successful`/`failed` already partition `requested` by construction (see
//! `netcat_core::fleet_runner::FleetResult`); this just attaches each
//! device's type and flips the matching boolean.

use std::collections::HashMap;

use netcat_core::{DeviceOutcome, DeviceType, FleetResult, JobStatus};

pub fn build_job_status(
    result: &FleetResult,
    device_types: &HashMap<String, DeviceType>,
    snapshot_timestamp: i64,
) -> JobStatus {
    let mut status = JobStatus::new(snapshot_timestamp);

    for device in &result.successful {
        status.device_info_dict.insert(
            device.clone(),
            DeviceOutcome {
                device_type: device_types.get(device).map(DeviceType::to_string).unwrap_or_default(),
                successful: true,
                failed: false,
            },
        );
    }

    for device in &result.failed {
        status.device_info_dict.insert(
            device.clone(),
            DeviceOutcome {
                device_type: device_types.get(device).map(DeviceType::to_string).unwrap_or_default(),
                successful: false,
                failed: true,
            },
        );
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_requested_device_lands_in_exactly_one_bucket() {
        let result = FleetResult {
            requested: vec!["a".to_string(), "b".to_string()],
            successful: vec!["a".to_string()],
            failed: vec!["b".to_string()],
        };
        let mut types = HashMap::new();
        types.insert("a".to_string(), DeviceType::CiscoRouter);
        types.insert("b".to_string(), DeviceType::F5);

        let status = build_job_status(&result, &types, 1000);
        assert!(status.device_info_dict["a"].successful);
        assert!(status.device_info_dict["b"].failed);
        assert_eq!(status.device_info_dict.len(), 2);
    }
}
