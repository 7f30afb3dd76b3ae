//! Relational document-store backend: one SQLite table per logical table,
//! each row a JSON blob keyed by the declared composite primary key.
//!
//! Grounded on the teacher's `scheduler::storage::sqlite::SqliteStorage`
//! (same `sqlx::SqlitePool` + `SqliteConnectOptions::create_if_missing`
//! bootstrap, same "run raw `CREATE TABLE IF NOT EXISTS`" approach rather
//! than `sqlx::migrate!`), wrapped the same way `MongoStorage` is — an
//! internal Tokio runtime absorbs the async driver so the public interface
//! stays blocking.

use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use netcat_core::{codec, CompressedSnapshot, DeviceSnapshot, DeviceType, JobStatus};

use crate::error::StorageError;
use crate::retry::write_with_retry;
use crate::traits::{StorageAdapter, StorageDocument, Table};

pub struct SqliteStorage {
    runtime: tokio::runtime::Runtime,
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn connect(database_url: &str) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Runtime::new().map_err(StorageError::Io)?;
        let pool = runtime.block_on(async {
            let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
            SqlitePool::connect_with(options).await
        })?;
        Ok(Self { runtime, pool })
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
}

impl StorageAdapter for SqliteStorage {
    fn create_tables(&self) -> Result<(), StorageError> {
        self.runtime.block_on(async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS info (
                    device_name TEXT NOT NULL,
                    snapshot_timestamp INTEGER NOT NULL,
                    device_type TEXT NOT NULL,
                    document TEXT NOT NULL,
                    PRIMARY KEY (device_name, snapshot_timestamp)
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                "CREATE INDEX IF NOT EXISTS idx_info_device_type ON info (device_type, snapshot_timestamp)",
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS backup (
                    device_name TEXT NOT NULL,
                    snapshot_timestamp INTEGER NOT NULL,
                    document TEXT NOT NULL,
                    PRIMARY KEY (device_name, snapshot_timestamp)
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS status (
                    snapshot_name TEXT NOT NULL,
                    snapshot_timestamp INTEGER NOT NULL,
                    document TEXT NOT NULL,
                    PRIMARY KEY (snapshot_name, snapshot_timestamp)
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            Ok::<(), sqlx::Error>(())
        })?;
        Ok(())
    }

    fn write(&self, table: Table, document: StorageDocument) -> Result<(), StorageError> {
        write_with_retry(|| {
            self.runtime.block_on(async {
                match (table, &document) {
                    (Table::Info, StorageDocument::Snapshot(snapshot)) => {
                        let compressed = Self::compress(snapshot, false)?;
                        let blob = serde_json::to_string(&compressed)?;
                        sqlx::query(
                            "INSERT OR REPLACE INTO info (device_name, snapshot_timestamp, device_type, document) VALUES (?, ?, ?, ?)",
                        )
                        .bind(&compressed.device_name)
                        .bind(compressed.snapshot_timestamp)
                        .bind(&compressed.device_type)
                        .bind(blob)
                        .execute(&self.pool)
                        .await?;
                    }
                    (Table::Backup, StorageDocument::Snapshot(snapshot)) => {
                        let compressed = Self::compress(snapshot, true)?;
                        let blob = serde_json::to_string(&compressed)?;
                        sqlx::query(
                            "INSERT OR REPLACE INTO backup (device_name, snapshot_timestamp, document) VALUES (?, ?, ?)",
                        )
                        .bind(&compressed.device_name)
                        .bind(compressed.snapshot_timestamp)
                        .bind(blob)
                        .execute(&self.pool)
                        .await?;
                    }
                    (Table::Status, StorageDocument::Status(status)) => {
                        let blob = serde_json::to_string(status)?;
                        sqlx::query(
                            "INSERT OR REPLACE INTO status (snapshot_name, snapshot_timestamp, document) VALUES (?, ?, ?)",
                        )
                        .bind(&status.snapshot_name)
                        .bind(status.snapshot_timestamp)
                        .bind(blob)
                        .execute(&self.pool)
                        .await?;
                    }
                    _ => {
                        return Err(StorageError::Query(
                            "document shape does not match destination table".into(),
                        ))
                    }
                }
                Ok(())
            })
        })?;
        info!(target: "netcat_storage::sqlite", "wrote document to '{}'", table.name());
        Ok(())
    }

    fn load_latest_backup(
        &self,
        device_name: &str,
        device_type: DeviceType,
    ) -> Result<DeviceSnapshot, StorageError> {
        let row = self.runtime.block_on(async {
            sqlx::query(
                "SELECT document FROM backup WHERE device_name = ? ORDER BY snapshot_timestamp DESC LIMIT 1",
            )
            .bind(device_name)
            .fetch_optional(&self.pool)
            .await
        })?;

        match row {
            Some(row) => {
                let blob: String = row.try_get("document")?;
                let compressed: CompressedSnapshot = serde_json::from_str(&blob)?;
                Self::decompress(compressed)
            }
            None => Ok(DeviceSnapshot::new(device_name, device_type, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_match_the_declared_schema() {
        assert_eq!(Table::Info.name(), "info");
        assert_eq!(Table::Backup.name(), "backup");
        assert_eq!(Table::Status.name(), "status");
    }
}
