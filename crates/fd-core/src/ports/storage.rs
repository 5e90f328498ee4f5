//! Key-value storage ports
//!
//! A [`StorageBackendPort`] is one string-to-string storage area (the durable
//! local area or the session area). Backends are never constructed by the
//! core directly: a [`StorageProviderPort`] hands them out on first use, so
//! code that merely holds a `SafeStorage` never touches storage until it
//! reads or writes.

use std::sync::Arc;

use thiserror::Error;

use crate::storage::StorageScope;

/// Storage errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is not available in this execution context.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Writing would exceed the storage quota.
    #[error("storage quota exceeded: {required} bytes required, limit {limit}")]
    QuotaExceeded { limit: u64, required: u64 },

    /// Access was denied by the platform.
    #[error("storage access denied: {0}")]
    PermissionDenied(String),

    /// Persisted data is corrupt or unreadable.
    #[error("storage data corrupt: {0}")]
    Corrupt(String),

    #[error("storage failed: {0}")]
    Other(String),
}

/// One key-value storage area.
pub trait StorageBackendPort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Hands out the backend for a storage scope.
pub trait StorageProviderPort: Send + Sync {
    fn acquire(&self, scope: StorageScope) -> Result<Arc<dyn StorageBackendPort>, StorageError>;
}

#[cfg(test)]
mockall::mock! {
    pub StorageBackend {}

    impl StorageBackendPort for StorageBackend {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
        fn remove(&self, key: &str) -> Result<(), StorageError>;
        fn clear(&self) -> Result<(), StorageError>;
        fn keys(&self) -> Result<Vec<String>, StorageError>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub StorageProvider {}

    impl StorageProviderPort for StorageProvider {
        fn acquire(&self, scope: StorageScope) -> Result<Arc<dyn StorageBackendPort>, StorageError>;
    }
}
