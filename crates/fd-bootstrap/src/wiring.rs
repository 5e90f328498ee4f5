//! # Dependency Injection
//!
//! Builds every adapter from `fd-infra`, wraps it behind its port, and hands
//! the ports to the `fd-app` stores. Empty configuration values are turned
//! into their defaults here and nowhere else.
//!
//! No business logic: what to do at startup lives in [`crate::runtime`].

use std::sync::Arc;

use fd_app::{
    AlertRegistry, AuthStateCleanup, CheckPaymentAlerts, FetchAlerts, LoadingRegistry,
    OnboardingProgressStore,
};
use fd_core::config::{AppConfig, OnboardingConfig};
use fd_core::onboarding::DEFAULT_ONBOARDING_TTL_MS;
use fd_core::ports::{
    BackendError, BackendPort, ClockPort, NotificationPort, StorageProviderPort,
};
use fd_core::storage::{CodecError, ObfuscationCodec, SafeStorage, SecureStorage, StorageScope};
use fd_infra::{AppStorageProvider, RestBackend, SystemClock};
use tracing::{info, warn};

pub type WiringResult<T> = Result<T, WiringError>;

/// Errors while assembling the application.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Secure storage initialization failed: {0}")]
    SecureStorageInit(#[from] CodecError),

    #[error("Backend initialization failed: {0}")]
    BackendInit(#[from] BackendError),
}

/// Every long-lived object of the application, assembled once at startup.
///
/// Stores are shared handles: cloning a registry out of the context still
/// refers to the same state.
pub struct AppContext {
    pub config: AppConfig,
    pub storage_provider: Arc<dyn StorageProviderPort>,
    pub local_storage: Arc<SafeStorage>,
    pub session_storage: Arc<SafeStorage>,
    pub secure_storage: Arc<SecureStorage>,
    pub alerts: AlertRegistry,
    pub loading: LoadingRegistry,
    pub onboarding: Arc<OnboardingProgressStore>,
    pub auth_cleanup: Arc<AuthStateCleanup>,
    /// `None` when no backend URL is configured.
    pub backend: Option<Arc<dyn BackendPort>>,
    pub notifier: Arc<dyn NotificationPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl AppContext {
    pub fn fetch_alerts(&self) -> Option<FetchAlerts> {
        self.backend.as_ref().map(|backend| {
            FetchAlerts::new(
                backend.clone(),
                self.alerts.clone(),
                self.loading.clone(),
                self.notifier.clone(),
            )
        })
    }

    pub fn check_payment_alerts(&self) -> Option<CheckPaymentAlerts> {
        self.backend.as_ref().map(|backend| {
            CheckPaymentAlerts::new(
                backend.clone(),
                self.alerts.clone(),
                self.loading.clone(),
                self.notifier.clone(),
            )
        })
    }
}

/// Onboarding TTL in milliseconds; 0 hours means the 24 hour default.
pub fn onboarding_ttl_ms(config: &OnboardingConfig) -> i64 {
    if config.ttl_hours == 0 {
        return DEFAULT_ONBOARDING_TTL_MS;
    }
    i64::try_from(config.ttl_hours)
        .unwrap_or(i64::MAX)
        .saturating_mul(60 * 60 * 1000)
}

/// The plaintext fallback of secure storage is only honoured in development.
pub fn plaintext_fallback_allowed(config: &AppConfig) -> bool {
    config.security.allow_plaintext_fallback && config.environment.is_development()
}

fn create_codec(config: &AppConfig) -> WiringResult<ObfuscationCodec> {
    let key = &config.security.obfuscation_key;
    if key.is_empty() {
        return Ok(ObfuscationCodec::default());
    }
    Ok(ObfuscationCodec::new(key)?)
}

fn create_backend(config: &AppConfig) -> WiringResult<Option<Arc<dyn BackendPort>>> {
    if config.backend.url.trim().is_empty() {
        info!("no backend url configured, remote features disabled");
        return Ok(None);
    }
    let backend = RestBackend::new(&config.backend.url, &config.backend.api_key)?;
    Ok(Some(Arc::new(backend)))
}

/// Wire all dependencies together.
///
/// # Errors
///
/// Returns `WiringError` if an adapter cannot be constructed.
pub fn wire_app(
    config: AppConfig,
    notifier: Arc<dyn NotificationPort>,
) -> WiringResult<AppContext> {
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    let data_dir = if config.storage.data_dir.as_os_str().is_empty() {
        warn!("no storage data_dir configured, durable storage unavailable");
        None
    } else {
        Some(config.storage.data_dir.clone())
    };
    let storage_provider: Arc<dyn StorageProviderPort> =
        Arc::new(AppStorageProvider::new(data_dir, config.storage.quota_bytes));
    let local_storage = Arc::new(SafeStorage::new(
        StorageScope::Local,
        storage_provider.clone(),
    ));
    let session_storage = Arc::new(SafeStorage::new(
        StorageScope::Session,
        storage_provider.clone(),
    ));

    if config.security.allow_plaintext_fallback && !config.environment.is_development() {
        warn!("allow_plaintext_fallback ignored outside development");
    }
    let secure_storage = Arc::new(
        SecureStorage::new(local_storage.clone(), create_codec(&config)?)
            .with_plaintext_fallback(plaintext_fallback_allowed(&config)),
    );

    let alerts = AlertRegistry::new(notifier.clone(), clock.clone());
    let loading = LoadingRegistry::new();
    let onboarding = Arc::new(
        OnboardingProgressStore::new(local_storage.clone(), clock.clone())
            .with_ttl_ms(onboarding_ttl_ms(&config.onboarding)),
    );
    let auth_cleanup = Arc::new(AuthStateCleanup::new(
        local_storage.clone(),
        session_storage.clone(),
    ));
    let backend = create_backend(&config)?;

    info!(
        environment = ?config.environment,
        backend = backend.is_some(),
        "application wired"
    );

    Ok(AppContext {
        config,
        storage_provider,
        local_storage,
        session_storage,
        secure_storage,
        alerts,
        loading,
        onboarding,
        auth_cleanup,
        backend,
        notifier,
        clock,
    })
}
