use std::sync::Arc;

use fd_core::auth::{detect_limbo, is_auth_key, LimboReason};
use fd_core::storage::{SafeStorage, StorageScope, SECURE_KEY_PREFIX};
use tracing::{debug, info, warn};

/// Keys removed by one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCleanupReport {
    pub removed: Vec<(StorageScope, String)>,
    /// Keys that matched the auth namespace but could not be removed.
    pub failed: Vec<(StorageScope, String)>,
}

impl AuthCleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Detects and clears inconsistent auth state in both storage scopes.
///
/// Obfuscated copies (`sec_<key>`) of auth keys belong to the namespace too.
pub struct AuthStateCleanup {
    local: Arc<SafeStorage>,
    session: Arc<SafeStorage>,
}

impl AuthStateCleanup {
    pub fn new(local: Arc<SafeStorage>, session: Arc<SafeStorage>) -> Self {
        Self { local, session }
    }

    fn scopes(&self) -> [&SafeStorage; 2] {
        [self.local.as_ref(), self.session.as_ref()]
    }

    /// Remove every auth key from both scopes, best effort.
    pub fn cleanup_auth_state(&self) -> AuthCleanupReport {
        let mut report = AuthCleanupReport::default();

        for storage in self.scopes() {
            let scope = storage.scope();
            for key in storage.keys().into_iter().filter(|k| is_namespaced(k)) {
                if storage.remove_item(&key) {
                    debug!(%scope, key = %key, "auth key removed");
                    report.removed.push((scope, key));
                } else {
                    report.failed.push((scope, key));
                }
            }
        }

        if report.is_clean() {
            info!(removed = report.removed_count(), "auth state cleaned");
        } else {
            warn!(
                removed = report.removed_count(),
                failed = report.failed.len(),
                "auth state only partially cleaned"
            );
        }
        report
    }

    /// First inconsistency found, checking local then session storage.
    ///
    /// Each scope is judged on its own keys.
    pub fn detect_limbo(&self) -> Option<LimboReason> {
        self.scopes().into_iter().find_map(|storage| {
            let keys = storage.keys();
            let reason = detect_limbo(keys.iter().map(|k| logical_key(k)));
            if let Some(reason) = reason {
                debug!(scope = %storage.scope(), %reason, "auth limbo detected");
            }
            reason
        })
    }

    pub fn check_for_auth_limbo_state(&self) -> bool {
        self.detect_limbo().is_some()
    }

    /// Clean up only when the stored state is inconsistent.
    pub fn recover_if_in_limbo(&self) -> Option<AuthCleanupReport> {
        let reason = self.detect_limbo()?;
        warn!(%reason, "auth state in limbo, clearing stored session");
        Some(self.cleanup_auth_state())
    }
}

fn logical_key(key: &str) -> &str {
    key.strip_prefix(SECURE_KEY_PREFIX).unwrap_or(key)
}

fn is_namespaced(key: &str) -> bool {
    is_auth_key(logical_key(key))
}
