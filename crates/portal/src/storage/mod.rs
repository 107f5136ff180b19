//! Client-side key/value storage.
//!
//! Two scopes exist, mirroring what a browser offers:
//!
//! - **tab-scoped** - lives as long as one tab (or CLI `--tab`), never shared
//! - **device-scoped** - survives restarts and is shared by every tab on the device
//!
//! Both are plain string key/value stores behind [`KeyValueStorage`] so the
//! identity layer can be tested with [`MemoryStorage`] and run against
//! [`FileStorage`]. Writes are last-writer-wins; there is no optimistic
//! concurrency control.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A synchronous string key/value store.
pub trait KeyValueStorage: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
