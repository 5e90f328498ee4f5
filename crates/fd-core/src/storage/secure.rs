use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::StorageError;

use super::{CodecError, ObfuscationCodec, SafeStorage};

/// Prefix of the physical key under which obfuscated values are stored.
pub const SECURE_KEY_PREFIX: &str = "sec_";

#[derive(Debug, Error)]
pub enum SecureStorageError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to decode stored value: {0}")]
    Decode(#[from] CodecError),
}

/// Obfuscated key-value storage on top of a [`SafeStorage`].
///
/// Logical key `k` is stored at physical key `sec_k`, encoded with an
/// [`ObfuscationCodec`]. Values written by older clients under the bare key
/// are migrated on first read.
///
/// See [`ObfuscationCodec`] for why this is not a confidentiality boundary.
pub struct SecureStorage {
    storage: Arc<SafeStorage>,
    codec: ObfuscationCodec,
    plaintext_fallback: bool,
}

impl SecureStorage {
    pub fn new(storage: Arc<SafeStorage>, codec: ObfuscationCodec) -> Self {
        Self {
            storage,
            codec,
            plaintext_fallback: false,
        }
    }

    /// Development-only escape hatch: when the obfuscated write fails, store
    /// the plaintext under the bare key instead of failing.
    ///
    /// Never enable this in production builds.
    pub fn with_plaintext_fallback(mut self, enabled: bool) -> Self {
        if enabled {
            warn!("secure storage plaintext fallback enabled (development only)");
        }
        self.plaintext_fallback = enabled;
        self
    }

    pub fn physical_key(key: &str) -> String {
        format!("{SECURE_KEY_PREFIX}{key}")
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), SecureStorageError> {
        let physical = Self::physical_key(key);
        let encoded = self.codec.encode(value);
        match self.storage.try_set_item(&physical, &encoded) {
            Ok(()) => Ok(()),
            Err(err) if self.plaintext_fallback => {
                warn!(
                    key,
                    error = %err,
                    "obfuscated write failed, storing plaintext (development fallback)"
                );
                self.storage.try_set_item(key, value)?;
                // reads prefer the obfuscated key, so an older value there
                // would shadow the one just written
                self.storage.remove_item(&physical);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read `key`, migrating a legacy plaintext entry if that is all there is.
    pub fn try_get_item(&self, key: &str) -> Result<Option<String>, SecureStorageError> {
        let physical = Self::physical_key(key);
        if let Some(value) = self.read_obfuscated(&physical)? {
            return Ok(Some(value));
        }

        match self.storage.try_get_item(key)? {
            Some(legacy) => {
                self.migrate_legacy(key, &legacy);
                Ok(Some(legacy))
            }
            // A concurrent reader may have finished the migration between the
            // two reads above; the legacy key is only removed after the
            // obfuscated copy exists.
            None => self.read_obfuscated(&physical),
        }
    }

    fn read_obfuscated(&self, physical: &str) -> Result<Option<String>, SecureStorageError> {
        match self.storage.try_get_item(physical)? {
            Some(encoded) => Ok(Some(self.codec.decode(&encoded)?)),
            None => Ok(None),
        }
    }

    /// Sentinel form of [`try_get_item`](Self::try_get_item): any failure,
    /// including an undecodable value, reads as `None`.
    pub fn get_item(&self, key: &str) -> Option<String> {
        match self.try_get_item(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "secure storage read failed");
                None
            }
        }
    }

    // The legacy entry is only removed once the obfuscated copy is written,
    // so a failed migration loses nothing and is retried on the next read.
    fn migrate_legacy(&self, key: &str, legacy: &str) {
        let encoded = self.codec.encode(legacy);
        match self.storage.try_set_item(&Self::physical_key(key), &encoded) {
            Ok(()) => {
                self.storage.remove_item(key);
                debug!(key, "migrated legacy storage entry");
            }
            Err(err) => {
                warn!(key, error = %err, "legacy storage migration deferred");
            }
        }
    }

    /// Remove both the obfuscated and any legacy entry for `key`.
    pub fn remove_item(&self, key: &str) -> bool {
        let secure = self.storage.remove_item(&Self::physical_key(key));
        let legacy = self.storage.remove_item(key);
        secure && legacy
    }

    /// Remove every obfuscated entry, leaving other keys untouched.
    pub fn clear(&self) -> bool {
        let keys = match self.storage.try_keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "secure storage clear failed");
                return false;
            }
        };

        keys.iter()
            .filter(|key| key.starts_with(SECURE_KEY_PREFIX))
            .fold(true, |ok, key| self.storage.remove_item(key) && ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::storage::{MockStorageBackend, MockStorageProvider};
    use crate::ports::{StorageBackendPort, StorageProviderPort};
    use crate::storage::test_support::{MemoryBackend, MemoryProvider};
    use crate::storage::StorageScope;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn memory_storage() -> Arc<SafeStorage> {
        Arc::new(SafeStorage::new(
            StorageScope::Local,
            Arc::new(MemoryProvider::default()),
        ))
    }

    fn secure(storage: &Arc<SafeStorage>) -> SecureStorage {
        SecureStorage::new(storage.clone(), ObfuscationCodec::default())
    }

    #[test]
    fn round_trip_stores_obfuscated_value() {
        let storage = memory_storage();
        let secure = secure(&storage);

        secure.set_item("user_role", "contador").unwrap();

        assert_eq!(secure.get_item("user_role"), Some("contador".to_string()));
        let raw = storage.get_item("sec_user_role").unwrap();
        assert_ne!(raw, "contador");
        assert_eq!(storage.get_item("user_role"), None);
    }

    #[test]
    fn round_trip_non_ascii() {
        let storage = memory_storage();
        let secure = secure(&storage);
        let value = "Razão social: Contábil Ação Ltda. — 100% ✓";

        secure.set_item("office", value).unwrap();
        assert_eq!(secure.get_item("office").as_deref(), Some(value));
    }

    #[test]
    fn missing_key_reads_none() {
        let storage = memory_storage();
        assert_eq!(secure(&storage).get_item("absent"), None);
    }

    #[test]
    fn legacy_value_is_migrated_on_read() {
        let storage = memory_storage();
        storage.set_item("theme", "dark");
        let secure = secure(&storage);

        assert_eq!(secure.get_item("theme"), Some("dark".to_string()));

        assert_eq!(storage.get_item("theme"), None);
        let migrated = storage.get_item("sec_theme").expect("obfuscated copy");
        assert_eq!(
            ObfuscationCodec::default().decode(&migrated).unwrap(),
            "dark"
        );

        // a second read takes the obfuscated path and returns the same value
        assert_eq!(secure.get_item("theme"), Some("dark".to_string()));
    }

    #[test]
    fn concurrent_migrations_are_idempotent() {
        let storage = memory_storage();
        storage.set_item("cnpj", "12.345.678/0001-90");
        let secure = Arc::new(secure(&storage));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let secure = secure.clone();
                std::thread::spawn(move || secure.get_item("cnpj"))
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap().as_deref(),
                Some("12.345.678/0001-90")
            );
        }
        assert_eq!(storage.get_item("cnpj"), None);
        assert_eq!(storage.keys(), vec!["sec_cnpj".to_string()]);
    }

    #[test]
    fn corrupt_value_reads_none() {
        let storage = memory_storage();
        storage.set_item("sec_broken", "%%% not base64 %%%");
        let secure = secure(&storage);

        assert_eq!(secure.get_item("broken"), None);
        assert!(matches!(
            secure.try_get_item("broken"),
            Err(SecureStorageError::Decode(_))
        ));
    }

    #[test]
    fn prefixed_value_wins_over_legacy() {
        let storage = memory_storage();
        let secure = secure(&storage);
        secure.set_item("k", "new").unwrap();
        storage.set_item("k", "old");

        assert_eq!(secure.get_item("k"), Some("new".to_string()));
        assert_eq!(storage.get_item("k"), Some("old".to_string()));
    }

    #[test]
    fn remove_item_drops_both_physical_keys() {
        let storage = memory_storage();
        let secure = secure(&storage);
        secure.set_item("k", "v").unwrap();
        storage.set_item("k", "legacy");

        assert!(secure.remove_item("k"));
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn clear_only_touches_prefixed_keys() {
        let storage = memory_storage();
        let secure = secure(&storage);
        secure.set_item("a", "1").unwrap();
        secure.set_item("b", "2").unwrap();
        storage.set_item("plain", "kept");

        assert!(secure.clear());
        assert_eq!(storage.keys(), vec!["plain".to_string()]);
    }

    fn failing_write_storage() -> (Arc<SafeStorage>, Arc<std::sync::Mutex<Vec<String>>>) {
        let written = Arc::new(std::sync::Mutex::new(Vec::new()));
        let written_clone = written.clone();

        let mut backend = MockStorageBackend::new();
        backend.expect_set().returning(move |key, _| {
            if key.starts_with(SECURE_KEY_PREFIX) {
                Err(StorageError::QuotaExceeded {
                    limit: 1,
                    required: 2,
                })
            } else {
                written_clone.lock().unwrap().push(key.to_string());
                Ok(())
            }
        });
        backend.expect_remove().returning(|_| Ok(()));
        let backend: Arc<dyn StorageBackendPort> = Arc::new(backend);

        let mut provider = MockStorageProvider::new();
        provider
            .expect_acquire()
            .returning(move |_| Ok(backend.clone()));

        (
            Arc::new(SafeStorage::new(StorageScope::Local, Arc::new(provider))),
            written,
        )
    }

    #[test]
    fn write_failure_is_reported_without_fallback() {
        let (storage, written) = failing_write_storage();
        let secure = SecureStorage::new(storage, ObfuscationCodec::default());

        let result = secure.set_item("k", "v");
        assert!(matches!(
            result,
            Err(SecureStorageError::Storage(StorageError::QuotaExceeded { .. }))
        ));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn development_fallback_stores_plaintext_under_bare_key() {
        let (storage, written) = failing_write_storage();
        let secure =
            SecureStorage::new(storage, ObfuscationCodec::default()).with_plaintext_fallback(true);

        secure.set_item("k", "v").unwrap();
        assert_eq!(*written.lock().unwrap(), vec!["k".to_string()]);
    }

    /// In-memory backend that can be told to reject obfuscated writes.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        reject_secure_writes: AtomicBool,
    }

    impl FlakyBackend {
        fn reject_secure_writes(&self, reject: bool) {
            self.reject_secure_writes.store(reject, Ordering::SeqCst);
        }
    }

    impl StorageBackendPort for FlakyBackend {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let rejected = self.reject_secure_writes.load(Ordering::SeqCst);
            if rejected && key.starts_with(SECURE_KEY_PREFIX) {
                return Err(StorageError::QuotaExceeded {
                    limit: 1,
                    required: value.len() as u64,
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear()
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }
    }

    struct FlakyProvider(Arc<FlakyBackend>);

    impl StorageProviderPort for FlakyProvider {
        fn acquire(
            &self,
            _scope: StorageScope,
        ) -> Result<Arc<dyn StorageBackendPort>, StorageError> {
            Ok(self.0.clone())
        }
    }

    fn flaky_storage(backend: &Arc<FlakyBackend>) -> Arc<SafeStorage> {
        Arc::new(SafeStorage::new(
            StorageScope::Local,
            Arc::new(FlakyProvider(backend.clone())),
        ))
    }

    #[test]
    fn failed_migration_keeps_legacy_entry_until_next_read() {
        let backend = Arc::new(FlakyBackend::default());
        let storage = flaky_storage(&backend);
        storage.set_item("theme", "dark");
        let secure = secure(&storage);

        backend.reject_secure_writes(true);
        assert_eq!(secure.get_item("theme").as_deref(), Some("dark"));
        assert_eq!(storage.get_item("theme").as_deref(), Some("dark"));
        assert_eq!(storage.get_item("sec_theme"), None);

        backend.reject_secure_writes(false);
        assert_eq!(secure.get_item("theme").as_deref(), Some("dark"));
        assert_eq!(storage.keys(), vec!["sec_theme".to_string()]);
    }

    #[test]
    fn development_fallback_drops_stale_obfuscated_value() {
        let backend = Arc::new(FlakyBackend::default());
        let storage = flaky_storage(&backend);
        let secure = SecureStorage::new(storage.clone(), ObfuscationCodec::default())
            .with_plaintext_fallback(true);
        secure.set_item("token", "old").unwrap();

        backend.reject_secure_writes(true);
        secure.set_item("token", "new").unwrap();

        assert_eq!(secure.get_item("token").as_deref(), Some("new"));
        assert_eq!(storage.keys(), vec!["token".to_string()]);
    }
}
