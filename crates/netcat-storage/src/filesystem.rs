//! Filesystem backend: one directory per table, each document one
//! indented-JSON file keyed by `deviceName__snapshotTimestamp` (or
//! `snapshotName__snapshotTimestamp` for `status`).
//!
//! Design decision (see DESIGN.md "Open Questions"): `loadLatestBackup`
//! performs a real scan-and-pick-latest lookup rather than the original
//! `netcat_fsdb.py`'s unconditional empty return — a silent no-op here
//! would quietly disable change detection for every operator who selects
//! this backend, which is worse than the minor cost of a directory scan.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use netcat_core::{codec, CompressedSnapshot, DeviceSnapshot, DeviceType, JobStatus};

use crate::error::StorageError;
use crate::retry::write_with_retry;
use crate::traits::{StorageAdapter, StorageDocument, Table};

pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_dir(&self, table: Table) -> PathBuf {
        self.root.join(table.name())
    }

    fn compress(snapshot: &DeviceSnapshot, backup_only: bool) -> Result<CompressedSnapshot, StorageError> {
        let projected = snapshot.project(backup_only);
        let mut output_formats = std::collections::BTreeMap::new();
        for (format_name, commands) in &projected.output_formats {
            let mut encoded_commands = indexmap::IndexMap::new();
            for (command, output) in commands {
                encoded_commands.insert(codec::encode_command(command), codec::compress_output(output)?);
            }
            output_formats.insert(format_name.clone(), encoded_commands);
        }
        Ok(CompressedSnapshot {
            snapshot_timestamp: projected.snapshot_timestamp,
            device_name: projected.device_name,
            device_type: projected.device_type,
            output_formats,
        })
    }

    fn decompress(compressed: CompressedSnapshot) -> Result<DeviceSnapshot, StorageError> {
        let device_type: DeviceType = compressed
            .device_type
            .parse()
            .map_err(StorageError::Query)?;
        let mut snapshot = DeviceSnapshot::new(compressed.device_name, device_type, compressed.snapshot_timestamp);
        for (format_name, commands) in compressed.output_formats {
            for (encoded_command, blob) in commands {
                let command = codec::decode_command(&encoded_command)?;
                let output = codec::decompress_output(&blob)?;
                snapshot.record(&format_name, &command, output);
            }
        }
        Ok(snapshot)
    }

    fn write_document(dir: &Path, key: &str, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{key}.json"));
        let tmp_path = dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl StorageAdapter for FilesystemStorage {
    fn create_tables(&self) -> Result<(), StorageError> {
        for table in [Table::Info, Table::Backup, Table::Status] {
            fs::create_dir_all(self.table_dir(table))?;
        }
        Ok(())
    }

    fn write(&self, table: Table, document: StorageDocument) -> Result<(), StorageError> {
        write_with_retry(|| {
            let dir = self.table_dir(table);
            match (table, &document) {
                (Table::Info, StorageDocument::Snapshot(snapshot)) => {
                    let compressed = Self::compress(snapshot, false)?;
                    let key = format!("{}__{}", compressed.device_name, compressed.snapshot_timestamp);
                    let contents = serde_json::to_string_pretty(&compressed)?;
                    Self::write_document(&dir, &key, &contents)
                }
                (Table::Backup, StorageDocument::Snapshot(snapshot)) => {
                    let compressed = Self::compress(snapshot, true)?;
                    let key = format!("{}__{}", compressed.device_name, compressed.snapshot_timestamp);
                    let contents = serde_json::to_string_pretty(&compressed)?;
                    Self::write_document(&dir, &key, &contents)
                }
                (Table::Status, StorageDocument::Status(status)) => {
                    let key = format!("{}__{}", status.snapshot_name, status.snapshot_timestamp);
                    let contents = serde_json::to_string_pretty(status)?;
                    Self::write_document(&dir, &key, &contents)
                }
                _ => Err(StorageError::Query(
                    "document shape does not match destination table".into(),
                )),
            }
        })?;
        info!(target: "netcat_storage::filesystem", "wrote document to '{}'", table.name());
        Ok(())
    }

    fn load_latest_backup(
        &self,
        device_name: &str,
        device_type: DeviceType,
    ) -> Result<DeviceSnapshot, StorageError> {
        let dir = self.table_dir(Table::Backup);
        if !dir.exists() {
            return Ok(DeviceSnapshot::new(device_name, device_type, 0));
        }

        let prefix = format!("{device_name}__");
        let mut latest: Option<(i64, PathBuf)> = None;

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".json") else { continue };
            let Some(timestamp_str) = stem.strip_prefix(&prefix) else { continue };
            let Ok(timestamp) = timestamp_str.parse::<i64>() else { continue };

            if latest.as_ref().map(|(t, _)| timestamp > *t).unwrap_or(true) {
                latest = Some((timestamp, entry.path()));
            }
        }

        match latest {
            Some((_, path)) => {
                let contents = fs::read_to_string(path)?;
                let compressed: CompressedSnapshot = serde_json::from_str(&contents)?;
                Self::decompress(compressed)
            }
            None => Ok(DeviceSnapshot::new(device_name, device_type, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn snapshot(device_name: &str, timestamp: i64, text: &str) -> DeviceSnapshot {
        let mut snap = DeviceSnapshot::new(device_name, DeviceType::CiscoRouter, timestamp);
        snap.record("backup_running", "show running-config", text.to_string());
        snap
    }

    #[test]
    fn create_tables_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.create_tables().unwrap();
        storage.create_tables().unwrap();
        for table in ["info", "backup", "status"] {
            assert!(dir.path().join(table).is_dir());
        }
    }

    #[test]
    fn write_then_load_latest_backup_round_trips() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.create_tables().unwrap();

        storage
            .write(Table::Backup, StorageDocument::Snapshot(snapshot("rtr1", 1000, "hostname foo\n")))
            .unwrap();
        storage
            .write(Table::Backup, StorageDocument::Snapshot(snapshot("rtr1", 2000, "hostname bar\n")))
            .unwrap();

        let latest = storage.load_latest_backup("rtr1", DeviceType::CiscoRouter).unwrap();
        assert_eq!(latest.snapshot_timestamp, 2000);
        assert_eq!(
            latest.output_formats["backup_running"]["show running-config"],
            "hostname bar\n"
        );
    }

    #[test]
    fn load_latest_backup_is_empty_when_nothing_was_ever_written() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.create_tables().unwrap();
        let latest = storage.load_latest_backup("ghost", DeviceType::PaloAlto).unwrap();
        assert!(latest.is_empty());
    }

    #[test]
    fn status_document_writes_under_its_own_key() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.create_tables().unwrap();
        let status = JobStatus::new(1234);
        storage.write(Table::Status, StorageDocument::Status(status)).unwrap();
        let path = dir.path().join("status").join("info_status__1234.json");
        assert!(path.exists());
    }
}
