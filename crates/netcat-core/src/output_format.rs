//! Data model: the shapes that flow from a device session into storage.
//!
//! Grounded on the teacher's `device_connection.rs` data-carrying structs
//! (`DeviceInfo`, `DeviceConfig`) for idiom — plain `Debug + Clone` structs,
//! `serde` derives for the ones that cross a storage boundary.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::device::DeviceType;

/// A labeled command catalog executed against one device.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    pub format_name: String,
    pub pre_commands: Vec<String>,
    pub commands: Vec<String>,
    pub post_commands: Vec<String>,
    /// Inclusive start / exclusive end line indices applied to each
    /// command's raw capture. Negative values index from the end, mirroring
    /// Python slice semantics (e.g. `-1` is "all but the last line").
    pub output_start: i64,
    pub output_end: i64,
}

impl OutputFormat {
    /// Whether this format is a configuration artifact subject to change
    /// detection (`formatName` starts with `backup`) as opposed to
    /// operational telemetry ("info").
    pub fn is_backup(&self) -> bool {
        self.format_name.starts_with("backup")
    }

    /// Apply `[outputStart:outputEnd]` Python-style slicing to a raw,
    /// newline-split capture, then join the retained lines with `\n` and
    /// append a trailing newline.
    pub fn trim_capture(&self, raw_lines: &[&str]) -> String {
        let len = raw_lines.len() as i64;
        let resolve = |idx: i64| -> i64 {
            if idx < 0 {
                (len + idx).max(0)
            } else {
                idx.min(len)
            }
        };
        let start = resolve(self.output_start) as usize;
        let end = (resolve(self.output_end) as usize).max(start);
        let slice = &raw_lines[start.min(raw_lines.len())..end.min(raw_lines.len())];
        let mut joined = slice.join("\n");
        joined.push('\n');
        joined
    }
}

/// One complete fleet-wide capture for one device.
///
/// `output_formats` is `formatName -> (command -> captured text)`. The outer
/// map is a `BTreeMap` (format names have no declared order worth keeping);
/// the inner map is an `IndexMap` because a format's value is an
/// insertion-ordered mapping — commands are recorded in the catalog's
/// declared order and must round-trip through storage in that same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub snapshot_timestamp: i64,
    pub device_name: String,
    pub device_type: String,
    pub output_formats: BTreeMap<String, IndexMap<String, String>>,
}

impl DeviceSnapshot {
    pub fn new(device_name: impl Into<String>, device_type: DeviceType, snapshot_timestamp: i64) -> Self {
        Self {
            snapshot_timestamp,
            device_name: device_name.into(),
            device_type: device_type.to_string(),
            output_formats: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, format_name: &str, command: &str, captured: String) {
        self.output_formats
            .entry(format_name.to_string())
            .or_default()
            .insert(command.to_string(), captured);
    }

    /// Project the snapshot onto only the formats whose name starts with
    /// `backup` (for the `backup` table) or the complement (for `info`).
    pub fn project(&self, backup_only: bool) -> Self {
        let mut projected = self.clone();
        projected
            .output_formats
            .retain(|name, _| name.starts_with("backup") == backup_only);
        projected
    }

    pub fn is_empty(&self) -> bool {
        self.output_formats.is_empty()
    }
}

/// Wire/storage form of a `DeviceSnapshot`: command names hex-escaped,
/// command outputs compressed and base-encoded. See `codec.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedSnapshot {
    pub snapshot_timestamp: i64,
    pub device_name: String,
    pub device_type: String,
    /// `formatName -> (escapedCommand -> compressedBlob)`, command order
    /// preserved the same way as `DeviceSnapshot::output_formats`.
    pub output_formats: BTreeMap<String, IndexMap<String, String>>,
}

/// Per-device outcome tracked in one `JobStatus` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub device_type: String,
    pub successful: bool,
    pub failed: bool,
}

/// One document per job: the fleet-wide result of a backup (or DNS check)
/// run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub snapshot_name: String,
    pub snapshot_timestamp: i64,
    pub device_info_dict: BTreeMap<String, DeviceOutcome>,
}

impl JobStatus {
    pub fn new(snapshot_timestamp: i64) -> Self {
        Self {
            snapshot_name: "info_status".to_string(),
            snapshot_timestamp,
            device_info_dict: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(start: i64, end: i64) -> OutputFormat {
        OutputFormat {
            format_name: "backup_running".to_string(),
            pre_commands: vec![],
            commands: vec![],
            post_commands: vec![],
            output_start: start,
            output_end: end,
        }
    }

    #[test]
    fn trim_capture_strips_echoed_command_and_prompt() {
        let lines = ["show running-config", "hostname foo", "interface eth0", "router#"];
        let format = fmt(1, -1);
        assert_eq!(format.trim_capture(&lines), "hostname foo\ninterface eth0\n");
    }

    #[test]
    fn trim_capture_handles_full_negative_range() {
        let lines = ["a", "b", "c"];
        let format = fmt(0, -1);
        assert_eq!(format.trim_capture(&lines), "a\nb\n");
    }

    #[test]
    fn is_backup_detects_prefix() {
        assert!(fmt(0, 0).is_backup());
        let mut info = fmt(0, 0);
        info.format_name = "info".to_string();
        assert!(!info.is_backup());
    }

    #[test]
    fn project_splits_backup_from_info_formats() {
        let mut snap = DeviceSnapshot::new("router1", DeviceType::CiscoRouter, 1000);
        snap.record("backup_running", "show running-config", "config\n".to_string());
        snap.record("info", "show version", "version\n".to_string());

        let backup = snap.project(true);
        assert_eq!(backup.output_formats.len(), 1);
        assert!(backup.output_formats.contains_key("backup_running"));

        let info = snap.project(false);
        assert_eq!(info.output_formats.len(), 1);
        assert!(info.output_formats.contains_key("info"));
    }
}
