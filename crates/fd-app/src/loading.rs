//! Keyed tracker of in-flight operations.
//!
//! Each long-running operation marks its key while it runs; a global progress
//! indicator shows while [`LoadingRegistry::is_any_loading`] is true.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error};

/// Map of operation key to loading flag. An absent key is not loading.
///
/// Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct LoadingRegistry {
    states: Arc<Mutex<HashMap<String, bool>>>,
}

impl LoadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Setting `false` removes the key.
    pub fn set_loading(&self, key: &str, loading: bool) {
        let mut states = self.lock();
        if loading {
            states.insert(key.to_string(), true);
        } else {
            states.remove(key);
        }
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.lock().get(key).copied().unwrap_or(false)
    }

    pub fn is_any_loading(&self) -> bool {
        self.lock().values().any(|loading| *loading)
    }

    pub fn clear_all_loading(&self) {
        self.lock().clear();
    }

    /// Keys currently loading, in no particular order.
    pub fn active_keys(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, loading)| **loading)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Run `operation` with `key` marked as loading.
    ///
    /// The key is cleared when the operation finishes, fails, panics or is
    /// dropped before completion. Errors are logged and returned unchanged.
    ///
    /// Keys are plain flags, not counters: use one key per in-flight
    /// operation. If two calls share a key, the first to finish clears it
    /// while the other is still running.
    pub async fn execute_with_loading<T, E, Fut>(&self, key: &str, operation: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let _guard = LoadingGuard::start(self, key);
        let result = operation.await;
        if let Err(err) = &result {
            error!(operation = key, error = %err, "operation failed");
        }
        result
    }
}

struct LoadingGuard<'a> {
    registry: &'a LoadingRegistry,
    key: &'a str,
}

impl<'a> LoadingGuard<'a> {
    fn start(registry: &'a LoadingRegistry, key: &'a str) -> Self {
        registry.set_loading(key, true);
        debug!(operation = key, "loading started");
        Self { registry, key }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.registry.set_loading(self.key, false);
        debug!(operation = self.key, "loading finished");
    }
}
