//! Storage Adapter: a narrow interface any document store plugs in behind.
//!
//! Grounded on the teacher's `scheduler::storage::traits::Storage` shape
//! (a small set of async methods implemented by one or more concrete
//! backends, selected by the driver at startup) narrowed to the three
//! operations the fleet automation workflows actually need: idempotent
//! schema creation, retried writes, and latest-backup lookup.

use netcat_core::{DeviceSnapshot, DeviceType, JobStatus};

use crate::error::StorageError;

/// One of the three logical tables/collections/directories a backend must
/// provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Info,
    Backup,
    Status,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Info => "info",
            Table::Backup => "backup",
            Table::Status => "status",
        }
    }
}

/// What gets written to a table. `Info`/`Backup` tables only ever receive
/// `Snapshot`; `Status` only ever receives `Status`. Backends validate this
/// pairing and return `StorageError::Query` on mismatch rather than
/// silently accepting the wrong shape.
#[derive(Debug, Clone)]
pub enum StorageDocument {
    Snapshot(DeviceSnapshot),
    Status(JobStatus),
}

/// The pluggable backend interface. Implementations are called from the
/// Fleet Runner's blocking worker threads (see `netcat_core::fleet_runner`)
/// — this trait is synchronous on purpose; an async driver crate wraps its
/// own Tokio runtime internally rather than pushing async up into the
/// engine (see `MongoStorage`/`SqliteStorage`).
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait StorageAdapter: Send + Sync {
    /// Create the backend's schema (tables/collections/directories and
    /// indexes) if it does not already exist. Must tolerate being called
    /// concurrently by multiple processes/workers and must be a no-op on
    /// a second call against an already-initialized backend.
    fn create_tables(&self) -> Result<(), StorageError>;

    /// Persist one document to `table`, retrying on a transient throttling
    /// error per the shared backoff policy (see `retry::write_with_retry`).
    /// `Info`/`Backup` documents are compressed before the backend-specific
    /// write; `Status` documents are written as-is.
    fn write(&self, table: Table, document: StorageDocument) -> Result<(), StorageError>;

    /// The most recent backup for `device_name`, decompressed, or an empty
    /// snapshot (same `device_name`/`device_type`, no recorded formats,
    /// `snapshot_timestamp` zero) if none exists — `device_type` is
    /// supplied by the caller since an empty result carries no catalog
    /// data of its own to infer it from.
    fn load_latest_backup(
        &self,
        device_name: &str,
        device_type: DeviceType,
    ) -> Result<DeviceSnapshot, StorageError>;
}
