//! Upgrade/download workflow: Palo Alto-only software lifecycle. With
//! `upgrade = false` the workflow only downloads the target version and its
//! chained dependencies; with `upgrade = true` it also installs and reboots.

use std::collections::HashMap;
use std::sync::Arc;

use netcat_core::{run_fleet, FleetResult, NetcatError};

use crate::adapters::Adapter;
use crate::inventory::DeviceRecord;
use crate::session_factory::open_session;

pub fn run(records: &[DeviceRecord], devices: Vec<String>, version: String, upgrade: bool) -> FleetResult {
    let by_name: HashMap<String, DeviceRecord> =
        records.iter().map(|r| (r.name.clone(), r.clone())).collect();
    let by_name = Arc::new(by_name);
    let version = Arc::new(version);

    run_fleet(&devices, move |device_name| {
        let record = by_name
            .get(device_name)
            .ok_or_else(|| NetcatError::ConfigurationFault(format!("unknown device {device_name}")))?;

        let mut session = open_session(record)?;
        let adapter = Adapter::new(record.device_type, &record.username);
        let ops = adapter.palo_alto_ops().ok_or_else(|| {
            NetcatError::ConfigurationFault(format!(
                "{device_name} is not a Palo Alto device; upgrade/download only applies to that platform"
            ))
        })?;

        ops.download_software(&mut session, &version)?;
        if upgrade {
            ops.upgrade_software(&mut session, &version)?;
        }

        session.close();
        Ok(())
    })
}
