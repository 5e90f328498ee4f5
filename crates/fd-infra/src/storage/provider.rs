use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fd_core::ports::{StorageBackendPort, StorageError, StorageProviderPort};
use fd_core::storage::StorageScope;
use tracing::info;

use super::{FileStorageBackend, InMemoryStorageBackend};

/// Default storage provider.
///
/// - `Local`: a [`FileStorageBackend`] under `data_dir`, or `Unavailable`
///   when no directory is configured.
/// - `Session`: one in-memory area shared by every acquirer of this provider.
pub struct AppStorageProvider {
    data_dir: Option<PathBuf>,
    quota_bytes: u64,
    local: Mutex<Option<Arc<FileStorageBackend>>>,
    session: Arc<InMemoryStorageBackend>,
}

impl AppStorageProvider {
    pub fn new(data_dir: Option<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            data_dir,
            quota_bytes,
            local: Mutex::new(None),
            session: Arc::new(InMemoryStorageBackend::new()),
        }
    }

    fn acquire_local(&self) -> Result<Arc<dyn StorageBackendPort>, StorageError> {
        let mut local = self.local.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(backend) = local.as_ref() {
            return Ok(backend.clone());
        }

        let dir = self.data_dir.as_ref().ok_or_else(|| {
            StorageError::Unavailable("no durable storage directory configured".to_string())
        })?;
        let backend = FileStorageBackend::in_dir(dir)
            .map_err(|e| StorageError::Unavailable(format!("{}: {e}", dir.display())))?
            .with_quota(self.quota_bytes);
        info!(path = %backend.path().display(), "durable storage opened");

        let backend = Arc::new(backend);
        *local = Some(backend.clone());
        Ok(backend)
    }
}

impl StorageProviderPort for AppStorageProvider {
    fn acquire(&self, scope: StorageScope) -> Result<Arc<dyn StorageBackendPort>, StorageError> {
        match scope {
            StorageScope::Local => self.acquire_local(),
            StorageScope::Session => Ok(self.session.clone()),
        }
    }
}

/// Provider for contexts without any storage (headless checks, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorageProvider;

impl StorageProviderPort for UnavailableStorageProvider {
    fn acquire(&self, scope: StorageScope) -> Result<Arc<dyn StorageBackendPort>, StorageError> {
        Err(StorageError::Unavailable(format!(
            "{scope} storage is not available in this context"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::storage::SafeStorage;
    use tempfile::TempDir;

    #[test]
    fn local_without_dir_is_unavailable() {
        let provider = AppStorageProvider::new(None, 0);
        assert!(matches!(
            provider.acquire(StorageScope::Local),
            Err(StorageError::Unavailable(_))
        ));
        assert!(provider.acquire(StorageScope::Session).is_ok());
    }

    #[test]
    fn session_area_is_shared_between_acquirers() {
        let provider = Arc::new(AppStorageProvider::new(None, 0));
        let a = SafeStorage::new(StorageScope::Session, provider.clone());
        let b = SafeStorage::new(StorageScope::Session, provider);

        assert!(a.set_item("k", "v"));
        assert_eq!(b.get_item("k"), Some("v".to_string()));
    }

    #[test]
    fn local_area_is_file_backed() {
        let temp_dir = TempDir::new().unwrap();
        let provider = Arc::new(AppStorageProvider::new(
            Some(temp_dir.path().join("storage")),
            0,
        ));
        let local = SafeStorage::new(StorageScope::Local, provider);

        // lazily created on first write
        assert!(!temp_dir.path().join("storage").exists());
        assert!(local.set_item("k", "v"));
        assert!(temp_dir
            .path()
            .join("storage")
            .join(crate::storage::DEFAULT_LOCAL_STORAGE_FILE)
            .exists());
    }

    #[test]
    fn unavailable_provider_fails_every_scope() {
        for scope in StorageScope::ALL {
            assert!(UnavailableStorageProvider.acquire(scope).is_err());
        }
    }
}
