//! Select and open a `StorageAdapter` backend from environment variables,
//! mirroring the driver-selects-the-backend-at-startup shape the original
//! `netcat_mongodb.py`/`netcat_dynamodb.py`/`netcat_fsdb.py` trio implies
//! (one deployment picks exactly one backend for its whole fleet).

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use netcat_storage::{FilesystemStorage, MongoStorage, SqliteStorage, StorageAdapter};

/// `NETCAT_STORAGE_BACKEND` ∈ {`mongo`, `sqlite`, `filesystem`}, defaulting
/// to `filesystem` for local/dev use without any external store.
pub fn open_storage() -> Result<Arc<dyn StorageAdapter>> {
    let backend = std::env::var("NETCAT_STORAGE_BACKEND").unwrap_or_else(|_| "filesystem".to_string());

    let storage: Arc<dyn StorageAdapter> = match backend.as_str() {
        "mongo" => {
            let uri = std::env::var("NETCAT_MONGO_URI").context("NETCAT_MONGO_URI is required for the mongo backend")?;
            let db_name = std::env::var("NETCAT_MONGO_DB").unwrap_or_else(|_| "netcat".to_string());
            Arc::new(MongoStorage::connect(&uri, &db_name)?)
        }
        "sqlite" => {
            let path = std::env::var("NETCAT_SQLITE_PATH").unwrap_or_else(|_| "netcat.sqlite3".to_string());
            Arc::new(SqliteStorage::connect(&path)?)
        }
        "filesystem" => {
            let root = std::env::var("NETCAT_FS_ROOT").unwrap_or_else(|_| "./netcat-storage".to_string());
            Arc::new(FilesystemStorage::new(root))
        }
        other => bail!("unsupported storage backend '{other}' (expected mongo, sqlite or filesystem)"),
    };

    storage.create_tables()?;
    Ok(storage)
}
