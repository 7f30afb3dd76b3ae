//! Backup workflow: capture each selected device's command catalog, detect
//! whether its configuration changed since the last backup, and persist.
//!
//! Mirrors the data flow in spec.md §2: CLI Session opens → Vendor Adapter
//! hardens the terminal → Snapshot Builder captures the catalog → Change
//! Detector compares against the last backup → backup table is written only
//! on change (or when forced) → info table is always written → Fleet Runner
//! aggregates → status table receives one `JobStatus` document for the job.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use netcat_core::{build_snapshot, detect_config_change, run_fleet, DeviceSnapshot, FleetResult, NetcatError};
use netcat_storage::{StorageAdapter, StorageDocument, Table};

use crate::adapters::Adapter;
use crate::inventory::DeviceRecord;
use crate::session_factory::open_session;

/// Write `snapshot` to the `info` table unconditionally and to the `backup`
/// table iff `changed || force_backup` (spec.md §8 invariant 4), logging
/// the no-op case so an operator scanning the log can tell a skip from a
/// crash.
fn persist_snapshot(
    storage: &dyn StorageAdapter,
    device_name: &str,
    snapshot: DeviceSnapshot,
    changed: bool,
    force_backup: bool,
) -> Result<(), NetcatError> {
    if changed || force_backup {
        storage
            .write(Table::Backup, StorageDocument::Snapshot(snapshot.clone()))
            .map_err(|e| NetcatError::ProtocolFault(e.to_string()))?;
    } else {
        info!(target: "workflows::backup", "no config change for {}, backup table not updated", device_name);
    }

    storage
        .write(Table::Info, StorageDocument::Snapshot(snapshot))
        .map_err(|e| NetcatError::ProtocolFault(e.to_string()))?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    records: &[DeviceRecord],
    devices: Vec<String>,
    storage: Arc<dyn StorageAdapter>,
    snapshot_timestamp: i64,
    force_backup: bool,
    test_run: bool,
) -> FleetResult {
    let by_name: HashMap<String, DeviceRecord> =
        records.iter().map(|r| (r.name.clone(), r.clone())).collect();
    let by_name = Arc::new(by_name);

    let fleet_result = run_fleet(&devices, move |device_name| {
        let record = by_name
            .get(device_name)
            .ok_or_else(|| NetcatError::ConfigurationFault(format!("unknown device {device_name}")))?;

        let mut session = open_session(record)?;
        let adapter = Adapter::new(record.device_type, &record.username);
        adapter.as_vendor().harden(&mut session, &record.name)?;

        let snapshot = build_snapshot(
            &mut session,
            adapter.as_vendor(),
            &record.name,
            record.device_type,
            snapshot_timestamp,
        )?;
        session.close();

        if test_run {
            info!(target: "workflows::backup", "test run for {}: no writes performed", device_name);
            return Ok(());
        }

        let previous = storage
            .load_latest_backup(&record.name, record.device_type)
            .map_err(|e| NetcatError::ProtocolFault(e.to_string()))?;
        let previous = if previous.is_empty() { None } else { Some(&previous) };
        let change = detect_config_change(&snapshot, previous);

        persist_snapshot(storage.as_ref(), device_name, snapshot, change.changed, force_backup)
    });

    fleet_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcat_core::DeviceType;
    use netcat_storage::{MockStorageAdapter, StorageError};

    fn sample_snapshot() -> DeviceSnapshot {
        let mut snap = DeviceSnapshot::new("rtr1", DeviceType::CiscoRouter, 1000);
        snap.record("backup_running", "show running-config", "hostname rtr1\n".to_string());
        snap
    }

    #[test]
    fn unchanged_and_not_forced_writes_only_info() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_write()
            .withf(|table, _| *table == Table::Info)
            .times(1)
            .returning(|_, _| Ok(()));

        persist_snapshot(&mock, "rtr1", sample_snapshot(), false, false).unwrap();
    }

    #[test]
    fn changed_writes_both_backup_and_info() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_write()
            .withf(|table, _| *table == Table::Backup)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_write()
            .withf(|table, _| *table == Table::Info)
            .times(1)
            .returning(|_, _| Ok(()));

        persist_snapshot(&mock, "rtr1", sample_snapshot(), true, false).unwrap();
    }

    #[test]
    fn forced_writes_both_even_when_unchanged() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_write().times(2).returning(|_, _| Ok(()));

        persist_snapshot(&mock, "rtr1", sample_snapshot(), false, true).unwrap();
    }

    #[test]
    fn info_write_failure_is_surfaced_even_when_backup_succeeds() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_write()
            .withf(|table, _| *table == Table::Backup)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_write()
            .withf(|table, _| *table == Table::Info)
            .times(1)
            .returning(|_, _| Err(StorageError::Query("simulated failure".into())));

        let result = persist_snapshot(&mock, "rtr1", sample_snapshot(), true, false);
        assert!(result.is_err());
    }
}
