//! Durable key-value storage for visitor state.
//!
//! Every visitor owns one [`KeyValueStore`]. It holds the persisted cart under
//! [`CART_KEY`] and per-user profile fields under `<field prefix><user id>`
//! keys. Values are opaque strings; callers choose the encoding.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] - process-local map with an optional byte quota
//! - [`FileStore`] - one directory per visitor, one file per key

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage key of the serialized cart.
pub const CART_KEY: &str = "cart";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write would exceed the store's size limit.
    #[error("storage quota exceeded ({used} of {limit} bytes)")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        used: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The namespace cannot be used as a file name.
    #[error("invalid storage namespace: {0}")]
    InvalidNamespace(String),

    /// The key cannot be used as a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// String key-value storage with the semantics of browser local storage.
///
/// Operations are synchronous and complete before returning; callers hold
/// their own locks around compound updates.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Absent keys yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the store is full, or an
    /// I/O error when the write cannot be made durable.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl std::fmt::Debug for dyn KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyValueStore")
    }
}

/// Owned, type-erased store as held by a visitor.
pub type SharedStore = std::sync::Arc<dyn KeyValueStore>;

/// Where visitor stores come from.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Fresh in-memory store per visitor; nothing survives a restart.
    Memory,
    /// One directory per visitor under this directory.
    Files(std::path::PathBuf),
}

impl StorageBackend {
    /// Open the store for one visitor namespace.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidNamespace`] for names that are not safe
    /// file names, or an I/O error when the data directory is unusable.
    pub fn open(&self, namespace: &str) -> Result<SharedStore, StorageError> {
        match self {
            Self::Memory => Ok(std::sync::Arc::new(MemoryStore::new())),
            Self::Files(dir) => Ok(std::sync::Arc::new(FileStore::open(dir, namespace)?)),
        }
    }

    /// Delete everything stored for one namespace.
    ///
    /// In-memory stores are dropped with their visitor, so this only touches
    /// the file backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidNamespace`] for unsafe names, or an I/O
    /// error when the directory cannot be removed.
    pub fn purge(&self, namespace: &str) -> Result<(), StorageError> {
        match self {
            Self::Memory => Ok(()),
            Self::Files(dir) => file::remove_namespace(dir, namespace),
        }
    }
}
