use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::ports::{StorageBackendPort, StorageError, StorageProviderPort};

use super::StorageScope;

/// Failure-tolerant accessor over one storage scope.
///
/// The sentinel API (`get_item`, `set_item`, `remove_item`, `clear`) never
/// fails: unavailable storage, quota and permission errors are logged and
/// surface as `None` / `false`. The `try_*` twins return the underlying
/// [`StorageError`] for callers that must tell "missing" from "failed".
///
/// The backend is acquired from the provider on first access, not at
/// construction. A successful acquisition is cached; a failed one is retried
/// on the next access.
pub struct SafeStorage {
    scope: StorageScope,
    provider: Arc<dyn StorageProviderPort>,
    backend: OnceCell<Arc<dyn StorageBackendPort>>,
}

impl SafeStorage {
    pub fn new(scope: StorageScope, provider: Arc<dyn StorageProviderPort>) -> Self {
        Self {
            scope,
            provider,
            backend: OnceCell::new(),
        }
    }

    pub fn scope(&self) -> StorageScope {
        self.scope
    }

    fn backend(&self) -> Result<&Arc<dyn StorageBackendPort>, StorageError> {
        self.backend.get_or_try_init(|| {
            let backend = self.provider.acquire(self.scope)?;
            debug!(scope = %self.scope, "storage backend acquired");
            Ok(backend)
        })
    }

    /// Whether the backend for this scope can be acquired.
    pub fn is_available(&self) -> bool {
        self.backend().is_ok()
    }

    pub fn try_get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend()?.get(key)
    }

    pub fn try_set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend()?.set(key, value)
    }

    pub fn try_remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.backend()?.remove(key)
    }

    pub fn try_clear(&self) -> Result<(), StorageError> {
        self.backend()?.clear()
    }

    pub fn try_keys(&self) -> Result<Vec<String>, StorageError> {
        self.backend()?.keys()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        match self.try_get_item(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(scope = %self.scope, key, error = %err, "storage read failed");
                None
            }
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> bool {
        match self.try_set_item(key, value) {
            Ok(()) => true,
            Err(err) => {
                warn!(scope = %self.scope, key, error = %err, "storage write failed");
                false
            }
        }
    }

    pub fn remove_item(&self, key: &str) -> bool {
        match self.try_remove_item(key) {
            Ok(()) => true,
            Err(err) => {
                warn!(scope = %self.scope, key, error = %err, "storage remove failed");
                false
            }
        }
    }

    pub fn clear(&self) -> bool {
        match self.try_clear() {
            Ok(()) => true,
            Err(err) => {
                warn!(scope = %self.scope, error = %err, "storage clear failed");
                false
            }
        }
    }

    /// All keys currently stored; empty when storage is unavailable.
    pub fn keys(&self) -> Vec<String> {
        match self.try_keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(scope = %self.scope, error = %err, "storage key listing failed");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for SafeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeStorage")
            .field("scope", &self.scope)
            .field("acquired", &self.backend.get().is_some())
            .finish()
    }
}
