//! Deploy workflow: push one or more configuration snippets to each selected
//! device, filling `{site_name}`/`{site_id}`/`{inet_gw}` placeholders per
//! device, then commit (unless `no_commit`).

use std::collections::HashMap;
use std::sync::Arc;

use netcat_core::{run_fleet, FleetResult, NetcatError};

use crate::adapters::Adapter;
use crate::inventory::DeviceRecord;
use crate::session_factory::open_session;
use crate::snippet::fill_placeholders;

pub fn run(
    records: &[DeviceRecord],
    devices: Vec<String>,
    snippets: Vec<String>,
    no_commit: bool,
) -> FleetResult {
    let by_name: HashMap<String, DeviceRecord> =
        records.iter().map(|r| (r.name.clone(), r.clone())).collect();
    let by_name = Arc::new(by_name);
    let snippets = Arc::new(snippets);

    run_fleet(&devices, move |device_name| {
        let record = by_name
            .get(device_name)
            .ok_or_else(|| NetcatError::ConfigurationFault(format!("unknown device {device_name}")))?;

        let mut session = open_session(record)?;
        let adapter = Adapter::new(record.device_type, &record.username);
        adapter.as_vendor().harden(&mut session, &record.name)?;

        for raw_snippet in snippets.iter() {
            let filled = fill_placeholders(raw_snippet, &record.name, &adapter, &mut session)?;
            adapter.deploy_snippet(&mut session, &record.name, &filled, no_commit)?;
        }

        session.close();
        Ok(())
    })
}
