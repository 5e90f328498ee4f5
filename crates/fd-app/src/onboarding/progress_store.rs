use std::sync::{Arc, Mutex, MutexGuard};

use fd_core::onboarding::{OnboardingData, OnboardingPatch, DEFAULT_ONBOARDING_TTL_MS};
use fd_core::ports::{ClockPort, StorageError};
use fd_core::storage::SafeStorage;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key of the persisted onboarding record.
pub const ONBOARDING_PROGRESS_KEY: &str = "onboarding_progress";

#[derive(Debug, Error)]
pub enum OnboardingProgressError {
    #[error("failed to serialize onboarding progress: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist onboarding progress: {0}")]
    Storage(#[from] StorageError),
}

/// Cache of the onboarding wizard's progress.
///
/// A passive store: it keeps whatever step and payloads the wizard hands it
/// and never validates step order. Every mutation is persisted right away
/// with a fresh timestamp; a persisted record older than the TTL is thrown
/// away on [`load`](Self::load).
pub struct OnboardingProgressStore {
    storage: Arc<SafeStorage>,
    clock: Arc<dyn ClockPort>,
    ttl_ms: i64,
    state: Mutex<OnboardingData>,
}

impl OnboardingProgressStore {
    pub fn new(storage: Arc<SafeStorage>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            storage,
            clock,
            ttl_ms: DEFAULT_ONBOARDING_TTL_MS,
            state: Mutex::new(OnboardingData::default()),
        }
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    fn lock(&self) -> MutexGuard<'_, OnboardingData> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the persisted record into memory.
    ///
    /// Expired or unreadable records are deleted and the zero state is used.
    pub fn load(&self) -> OnboardingData {
        let loaded = match self.storage.get_item(ONBOARDING_PROGRESS_KEY) {
            None => OnboardingData::default(),
            Some(raw) => match serde_json::from_str::<OnboardingData>(&raw) {
                Ok(data) if data.is_expired(self.clock.now_ms(), self.ttl_ms) => {
                    info!(saved_at = data.timestamp, "onboarding progress expired, discarding");
                    self.storage.remove_item(ONBOARDING_PROGRESS_KEY);
                    OnboardingData::default()
                }
                Ok(data) => {
                    debug!(step = data.current_step, "onboarding progress restored");
                    data
                }
                Err(err) => {
                    warn!(error = %err, "unreadable onboarding progress, discarding");
                    self.storage.remove_item(ONBOARDING_PROGRESS_KEY);
                    OnboardingData::default()
                }
            },
        };

        *self.lock() = loaded.clone();
        loaded
    }

    /// Merge `patch` into the current state and persist it.
    ///
    /// The in-memory state is updated even when persisting fails; the error
    /// only reports that the change will not survive a reload.
    ///
    /// The state lock is held until the write returns, so concurrent updates
    /// reach storage in the same order they were applied in memory.
    pub fn update(
        &self,
        patch: OnboardingPatch,
    ) -> Result<OnboardingData, OnboardingProgressError> {
        let mut state = self.lock();
        state.merge(patch);
        state.timestamp = self.clock.now_ms();
        let snapshot = state.clone();

        let json = serde_json::to_string(&snapshot)?;
        self.storage.try_set_item(ONBOARDING_PROGRESS_KEY, &json)?;
        drop(state);

        debug!(step = snapshot.current_step, "onboarding progress saved");
        Ok(snapshot)
    }

    /// Reset to the zero state and delete the persisted record.
    pub fn clear(&self) {
        let mut state = self.lock();
        *state = OnboardingData::default();
        self.storage.remove_item(ONBOARDING_PROGRESS_KEY);
        drop(state);
        debug!("onboarding progress cleared");
    }

    pub fn has_progress(&self) -> bool {
        self.lock().has_progress()
    }

    pub fn current(&self) -> OnboardingData {
        self.lock().clone()
    }
}
