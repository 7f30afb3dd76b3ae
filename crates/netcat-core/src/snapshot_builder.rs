//! Snapshot Builder: execute one device's command catalog and assemble a
//! `DeviceSnapshot`.
//!
//! Grounded on the original driver's per-format loop in `netcat_backup.py`
//! (`BackupController.get_snapshot`): pre-commands run and are discarded,
//! capture commands are trimmed with the format's declared
//! `outputStart`/`outputEnd` window and recorded, post-commands run and are
//! discarded. Identity fields (`deviceName`, `deviceType`,
//! `snapshotTimestamp`) are supplied by the caller, not derived here — the
//! Fleet Runner's driver assigns one `snapshotTimestamp` for the whole job
//! before fan-out.

use tracing::{debug, info};

use crate::device::DeviceType;
use crate::error::NetcatError;
use crate::output_format::DeviceSnapshot;
use crate::session::CliSession;
use crate::settings::{get_timeout, TimeoutKind};
use crate::vendors::VendorAdapter;

/// Run every `OutputFormat` in `adapter`'s catalog against `session`,
/// in catalog order, and assemble the resulting `DeviceSnapshot`.
///
/// Within one format: every `preCommand` runs first (output discarded),
/// then every capture `command` runs and its trimmed output is recorded,
/// then every `postCommand` runs (output discarded). Formats execute in
/// the order the adapter declares them.
pub fn build_snapshot(
    session: &mut CliSession,
    adapter: &dyn VendorAdapter,
    device_name: &str,
    device_type: DeviceType,
    snapshot_timestamp: i64,
) -> Result<DeviceSnapshot, NetcatError> {
    let mut snapshot = DeviceSnapshot::new(device_name, device_type, snapshot_timestamp);
    let prompt = adapter.cli_prompt_pattern(device_name);
    let timeout = get_timeout(TimeoutKind::Command);

    for format in adapter.output_formats() {
        debug!(target: "snapshot_builder", "capturing format '{}' for {}", format.format_name, device_name);

        for pre in &format.pre_commands {
            session.send_with_timeout(pre, &prompt, timeout)?;
        }

        for command in &format.commands {
            let raw = session.send_with_timeout(command, &prompt, timeout)?;
            let raw_lines: Vec<&str> = raw.lines().collect();
            let trimmed = format.trim_capture(&raw_lines);
            snapshot.record(&format.format_name, command, trimmed);
        }

        for post in &format.post_commands {
            session.send_with_timeout(post, &prompt, timeout)?;
        }
    }

    info!(target: "snapshot_builder", "snapshot complete for {} ({} formats)", device_name, snapshot.output_formats.len());
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_format::OutputFormat;
    use std::any::Any;

    struct StubAdapter {
        formats: Vec<OutputFormat>,
    }

    impl VendorAdapter for StubAdapter {
        fn cli_prompt_pattern(&self, _device_name: &str) -> String {
            r"router# ".to_string()
        }
        fn password_prompt_pattern(&self) -> String {
            "Password: ".to_string()
        }
        fn output_formats(&self) -> Vec<OutputFormat> {
            self.formats.clone()
        }
        fn harden(&self, _session: &mut CliSession, _device_name: &str) -> Result<(), NetcatError> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn catalog_order_is_preserved_in_the_resulting_snapshot() {
        let adapter = StubAdapter {
            formats: vec![
                OutputFormat {
                    format_name: "backup_running".to_string(),
                    pre_commands: vec![],
                    commands: vec!["show running-config".to_string()],
                    post_commands: vec![],
                    output_start: 0,
                    output_end: 0,
                },
                OutputFormat {
                    format_name: "info".to_string(),
                    pre_commands: vec![],
                    commands: vec!["show clock".to_string()],
                    post_commands: vec![],
                    output_start: 0,
                    output_end: 0,
                },
            ],
        };
        let formats: Vec<&str> = adapter
            .output_formats()
            .iter()
            .map(|f| f.format_name.as_str())
            .collect();
        assert_eq!(formats, vec!["backup_running", "info"]);
    }
}
