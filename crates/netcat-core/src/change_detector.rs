//! Change Detector: decide whether a fresh snapshot's backup formats differ
//! meaningfully from the most recent prior backup.
//!
//! Grounded on `netcat_backup.py`'s `compare_command_outputs` (the four
//! known-noise exclusions) and `detect_config_change` (iterates only the
//! *current* snapshot's commands — a command dropped from the catalog since
//! the last backup is silently ignored rather than counted as a removal;
//! preserved here as the source's documented behavior, not reproduced by
//! accident).

use tracing::info;

use crate::output_format::DeviceSnapshot;

/// Line fragments that make an otherwise-differing line ignorable. A line
/// differs but is still not "changed" when either side contains one of
/// these.
const NOISE_FRAGMENTS: [&str; 4] = ["!Time:", "no ip domain-lookup", "state up", "state down"];

#[derive(Debug, Clone)]
pub struct ChangeResult {
    pub changed: bool,
    /// `(formatName, command)` of the first difference found, for logging.
    pub first_diff: Option<(String, String)>,
}

/// Compare two command outputs line-by-line, ignoring differences on lines
/// that carry known-volatile fragments.
pub fn compare_command_outputs(previous: &str, current: &str) -> bool {
    let prev_lines: Vec<&str> = previous.lines().collect();
    let cur_lines: Vec<&str> = current.lines().collect();

    if prev_lines.len() != cur_lines.len() {
        return true;
    }

    for (prev_line, cur_line) in prev_lines.iter().zip(cur_lines.iter()) {
        if prev_line == cur_line {
            continue;
        }
        let is_noise = NOISE_FRAGMENTS
            .iter()
            .any(|frag| prev_line.contains(frag) || cur_line.contains(frag));
        if !is_noise {
            return true;
        }
    }

    false
}

/// Decide whether `current`'s backup formats differ from `previous`'s.
/// `previous == None` (no prior backup for this device) is always a change.
///
/// Only formats/commands present in `current` are inspected: a command that
/// existed in `previous` but was dropped from the catalog is never
/// considered for comparison.
pub fn detect_config_change(current: &DeviceSnapshot, previous: Option<&DeviceSnapshot>) -> ChangeResult {
    let previous = match previous {
        None => {
            return ChangeResult {
                changed: true,
                first_diff: None,
            }
        }
        Some(p) => p,
    };

    for (format_name, commands) in &current.output_formats {
        if !format_name.starts_with("backup") {
            continue;
        }
        let prev_commands = previous.output_formats.get(format_name);

        for (command, cur_output) in commands {
            let prev_output = prev_commands.and_then(|m| m.get(command));
            let differs = match prev_output {
                None => true,
                Some(prev_output) => compare_command_outputs(prev_output, cur_output),
            };
            if differs {
                info!(
                    target: "change_detector",
                    "config change detected in {}::{}",
                    format_name, command
                );
                return ChangeResult {
                    changed: true,
                    first_diff: Some((format_name.clone(), command.clone())),
                };
            }
        }
    }

    info!(target: "change_detector", "no config change detected for {}", current.device_name);
    ChangeResult {
        changed: false,
        first_diff: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;

    fn snap_with(command_output: &str) -> DeviceSnapshot {
        let mut snap = DeviceSnapshot::new("router1", DeviceType::CiscoRouter, 1000);
        snap.record("backup_running", "show running-config", command_output.to_string());
        snap
    }

    #[test]
    fn identical_except_time_line_is_not_changed() {
        let previous = snap_with("hostname foo\n!Time: 10:00:00\n");
        let current = snap_with("hostname foo\n!Time: 10:05:00\n");
        let result = detect_config_change(&current, Some(&previous));
        assert!(!result.changed);
    }

    #[test]
    fn different_line_counts_are_changed() {
        let previous = snap_with("hostname foo\n");
        let current = snap_with("hostname foo\ninterface eth0\n");
        let result = detect_config_change(&current, Some(&previous));
        assert!(result.changed);
    }

    #[test]
    fn non_excluded_difference_is_changed() {
        let previous = snap_with("hostname foo\n");
        let current = snap_with("hostname bar\n");
        let result = detect_config_change(&current, Some(&previous));
        assert!(result.changed);
        assert_eq!(
            result.first_diff,
            Some(("backup_running".to_string(), "show running-config".to_string()))
        );
    }

    #[test]
    fn missing_previous_backup_is_always_changed() {
        let current = snap_with("hostname foo\n");
        let result = detect_config_change(&current, None);
        assert!(result.changed);
    }

    #[test]
    fn commands_removed_from_the_catalog_are_not_considered() {
        let mut previous = snap_with("hostname foo\n");
        previous.record("backup_running", "show clock", "10:00:00\n".to_string());
        let current = snap_with("hostname foo\n");
        let result = detect_config_change(&current, Some(&previous));
        assert!(!result.changed);
    }
}
