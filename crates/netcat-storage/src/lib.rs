pub mod error;
pub mod filesystem;
pub mod mongo;
pub mod retry;
pub mod sqlite;
pub mod traits;

pub use error::{Retryable, StorageError};
pub use filesystem::FilesystemStorage;
pub use mongo::MongoStorage;
pub use sqlite::SqliteStorage;
pub use traits::{StorageAdapter, StorageDocument, Table};

#[cfg(feature = "mock")]
pub use traits::MockStorageAdapter;
