//! Document-store backend (MongoDB-compatible) — collections `info`,
//! `backup`, `status`.
//!
//! The Storage Adapter trait (`traits::StorageAdapter`) is synchronous
//! because it is called from the Fleet Runner's blocking OS-thread
//! workers (see spec.md §5); this backend owns a small Tokio runtime
//! internally and blocks on it for every call rather than pushing async
//! up into the engine, the same boundary-crossing shape the teacher's own
//! `scheduler` crate draws between its `apalis`-async job layer and its
//! blocking SSH execution.

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, FindOneOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use netcat_core::{codec, CompressedSnapshot, DeviceSnapshot, DeviceType, JobStatus};

use crate::error::StorageError;
use crate::retry::write_with_retry;
use crate::traits::{StorageAdapter, StorageDocument, Table};

pub struct MongoStorage {
    runtime: tokio::runtime::Runtime,
    db: Database,
}

impl MongoStorage {
    pub fn connect(connection_uri: &str, database_name: &str) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Runtime::new().map_err(StorageError::Io)?;
        let db = runtime.block_on(async {
            let options = ClientOptions::parse(connection_uri).await?;
            let client = Client::with_options(options)?;
            Ok::<Database, mongodb::error::Error>(client.database(database_name))
        })?;
        Ok(Self { runtime, db })
    }

    fn snapshot_collection(&self, table: Table) -> Collection<CompressedSnapshot> {
        self.db.collection(table.name())
    }

    fn status_collection(&self) -> Collection<JobStatus> {
        self.db.collection(Table::Status.name())
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

impl StorageAdapter for MongoStorage {
    fn create_tables(&self) -> Result<(), StorageError> {
        self.runtime.block_on(async {
            let backup_key = IndexModel::builder()
                .keys(doc! { "device_name": 1, "snapshot_timestamp": -1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.snapshot_collection(Table::Backup)
                .create_index(backup_key, None)
                .await?;

            let info_key = IndexModel::builder()
                .keys(doc! { "device_name": 1, "snapshot_timestamp": -1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.snapshot_collection(Table::Info)
                .create_index(info_key, None)
                .await?;

            let info_type_key = IndexModel::builder()
                .keys(doc! { "device_type": 1, "snapshot_timestamp": -1 })
                .build();
            self.snapshot_collection(Table::Info)
                .create_index(info_type_key, None)
                .await?;

            let status_key = IndexModel::builder()
                .keys(doc! { "snapshot_name": 1, "snapshot_timestamp": -1 })
                .build();
            self.status_collection().create_index(status_key, None).await?;

            debug!(target: "netcat_storage::mongo", "indexes ensured on info/backup/status collections");
            Ok::<(), mongodb::error::Error>(())
        })?;
        Ok(())
    }

    fn write(&self, table: Table, document: StorageDocument) -> Result<(), StorageError> {
        write_with_retry(|| {
            self.runtime.block_on(async {
                match (table, &document) {
                    (Table::Info, StorageDocument::Snapshot(snapshot)) => {
                        let compressed = Self::compress(snapshot, false)?;
                        self.snapshot_collection(Table::Info)
                            .insert_one(compressed, None)
                            .await?;
                    }
                    (Table::Backup, StorageDocument::Snapshot(snapshot)) => {
                        let compressed = Self::compress(snapshot, true)?;
                        self.snapshot_collection(Table::Backup)
                            .insert_one(compressed, None)
                            .await?;
                    }
                    (Table::Status, StorageDocument::Status(status)) => {
                        self.status_collection().insert_one(status.clone(), None).await?;
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
        info!(target: "netcat_storage::mongo", "wrote document to '{}'", table.name());
        Ok(())
    }

    fn load_latest_backup(
        &self,
        device_name: &str,
        device_type: DeviceType,
    ) -> Result<DeviceSnapshot, StorageError> {
        let found = self.runtime.block_on(async {
            let options = FindOneOptions::builder()
                .sort(doc! { "snapshot_timestamp": -1 })
                .build();
            self.snapshot_collection(Table::Backup)
                .find_one(doc! { "device_name": device_name }, options)
                .await
        })?;

        match found {
            Some(compressed) => Self::decompress(compressed),
            None => Ok(DeviceSnapshot::new(device_name, device_type, 0)),
        }
    }
}
