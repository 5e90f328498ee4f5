//! File-backed durable storage area.
//!
//! The whole area is one JSON object file. It is read lazily on first access
//! and rewritten on every mutation through a temp file + rename, so a crash
//! mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fd_core::ports::{StorageBackendPort, StorageError};
use tracing::debug;

pub const DEFAULT_LOCAL_STORAGE_FILE: &str = "local_storage.json";

type Entries = BTreeMap<String, String>;

pub struct FileStorageBackend {
    path: PathBuf,
    quota_bytes: Option<u64>,
    cache: Mutex<Option<Entries>>,
}

impl FileStorageBackend {
    /// Create a backend persisting to `path`. Nothing is read until first use.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            quota_bytes: None,
            cache: Mutex::new(None),
        }
    }

    /// Create a backend using [`DEFAULT_LOCAL_STORAGE_FILE`] inside `dir`,
    /// creating the directory if needed.
    pub fn in_dir(dir: &Path) -> Result<Self, io::Error> {
        fs::create_dir_all(dir)?;
        Ok(Self::new(dir.join(DEFAULT_LOCAL_STORAGE_FILE)))
    }

    /// Limit the serialized size of the area; `0` means unlimited.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = (quota_bytes > 0).then_some(quota_bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map_io_error(context: &str, err: io::Error) -> StorageError {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(format!("{context}: {err}"))
            }
            _ => StorageError::Other(format!("{context}: {err}")),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Entries>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(Self::map_io_error("failed to read storage file", err)),
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt(format!(
                "failed to parse storage file {}: {e}",
                self.path.display()
            ))
        })
    }

    fn persist(&self, entries: &Entries) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries)
            .map_err(|e| StorageError::Other(format!("failed to serialize storage: {e}")))?;

        if let Some(limit) = self.quota_bytes {
            let required = json.len() as u64;
            if required > limit {
                return Err(StorageError::QuotaExceeded { limit, required });
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Self::map_io_error("failed to create storage dir", e))?;
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)
            .map_err(|e| Self::map_io_error("failed to write storage temp file", e))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| Self::map_io_error("failed to rename storage file", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| Self::map_io_error("failed to set storage permissions", e))?;
        }

        debug!(path = %self.path.display(), entries = entries.len(), "storage file persisted");
        Ok(())
    }

    fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut Entries) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        match guard.as_mut() {
            Some(entries) => f(entries),
            None => Err(StorageError::Other("storage cache not loaded".to_string())),
        }
    }
}

impl StorageBackendPort for FileStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries(|entries| Ok(entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            let previous = entries.insert(key.to_string(), value.to_string());
            if let Err(err) = self.persist(entries) {
                match previous {
                    Some(previous) => entries.insert(key.to_string(), previous),
                    None => entries.remove(key),
                };
                return Err(err);
            }
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            if let Some(previous) = entries.remove(key) {
                if let Err(err) = self.persist(entries) {
                    entries.insert(key.to_string(), previous);
                    return Err(err);
                }
            }
            Ok(())
        })
    }

    // Does not read the old file, so clearing also recovers a corrupt one.
    fn clear(&self) -> Result<(), StorageError> {
        let mut cache = self.lock();
        let empty = Entries::new();
        self.persist(&empty)?;
        *cache = Some(empty);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.with_entries(|entries| Ok(entries.keys().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileStorageBackend::new(temp_dir.path().join("absent.json"));

        assert_eq!(backend.get("k").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn values_survive_a_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileStorageBackend::in_dir(temp_dir.path()).unwrap();
        backend.set("onboarding_progress", "{\"currentStep\":2}").unwrap();
        backend.set("theme", "dark").unwrap();
        backend.remove("theme").unwrap();

        let reopened = FileStorageBackend::in_dir(temp_dir.path()).unwrap();
        assert_eq!(
            reopened.get("onboarding_progress").unwrap().as_deref(),
            Some("{\"currentStep\":2}")
        );
        assert_eq!(reopened.get("theme").unwrap(), None);
    }

    #[test]
    fn quota_is_enforced_and_rolled_back() {
        let temp_dir = TempDir::new().unwrap();
        let backend =
            FileStorageBackend::new(temp_dir.path().join("store.json")).with_quota(32);

        backend.set("a", "small").unwrap();
        let err = backend.set("b", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 32, .. }));

        assert_eq!(backend.get("b").unwrap(), None);
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn corrupt_file_is_reported_and_clear_recovers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let backend = FileStorageBackend::new(path.clone());
        assert!(matches!(backend.get("k"), Err(StorageError::Corrupt(_))));

        backend.clear().unwrap();
        assert!(backend.keys().unwrap().is_empty());
        backend.set("k", "v").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"k\":\"v\"}");
    }

    #[test]
    fn empty_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "").unwrap();

        let backend = FileStorageBackend::new(path);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn concurrent_set_and_clear_keep_file_and_cache_in_sync() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let backend = std::sync::Arc::new(FileStorageBackend::new(path.clone()));

        for round in 0..20 {
            let writer = {
                let backend = backend.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        backend.set(&format!("k{round}-{i}"), "v").unwrap();
                    }
                })
            };
            let clearer = {
                let backend = backend.clone();
                std::thread::spawn(move || backend.clear().unwrap())
            };
            writer.join().unwrap();
            clearer.join().unwrap();

            let on_disk = FileStorageBackend::new(path.clone()).keys().unwrap();
            assert_eq!(on_disk, backend.keys().unwrap());
        }
    }

    #[cfg(unix)]
    #[test]
    fn storage_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let backend = FileStorageBackend::in_dir(temp_dir.path()).unwrap();
        backend.set("k", "v").unwrap();

        let mode = fs::metadata(backend.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
