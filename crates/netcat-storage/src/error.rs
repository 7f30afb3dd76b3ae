use thiserror::Error;

/// Error taxonomy for the Storage Adapter. Kept separate from
/// `netcat_core::NetcatError` to avoid a circular dependency between the
/// engine crate and this one; the engine only needs to know whether a
/// storage call ultimately failed, via the `ConfigurationFault`-style
/// propagation at the driver boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("storage query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no document found for {0}")]
    NotFound(String),

    #[error("artifact codec error: {0}")]
    Codec(#[from] netcat_core::NetcatError),

    #[error("storage throttled after {attempts} attempts")]
    Throttled { attempts: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Whether an error represents a transient, retryable condition
/// (provisioned-throughput exceeded, database momentarily busy/locked) as
/// opposed to a hard failure that should fail the write immediately.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            StorageError::Mongo(e) => mongo_error_is_throttling(e),
            StorageError::Sqlite(e) => sqlite_error_is_busy(e),
            StorageError::Connection(msg) | StorageError::Query(msg) => contains_throttle_marker(msg),
            _ => false,
        }
    }
}

fn contains_throttle_marker(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("throttl") || lower.contains("too large") || lower.contains("provisioned throughput")
}

fn mongo_error_is_throttling(e: &mongodb::error::Error) -> bool {
    let message = e.to_string().to_lowercase();
    message.contains("throughput") || message.contains("throttl") || message.contains("too many requests")
}

fn sqlite_error_is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_lowercase();
            message.contains("locked") || message.contains("busy")
        }
        _ => false,
    }
}
