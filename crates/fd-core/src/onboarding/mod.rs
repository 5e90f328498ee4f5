//! Onboarding domain models
//!
//! The onboarding wizard walks a new office through registration, first
//! client, fiscal, banking and team steps. Its progress is cached locally so
//! a reload does not lose typed-in data; this module defines that cached
//! record and the merge rules for partial updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default lifetime of a persisted onboarding record (24h).
pub const DEFAULT_ONBOARDING_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Persisted onboarding progress.
///
/// Step payloads are whatever the wizard forms produce; the store does not
/// interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingData {
    pub current_step: u32,
    #[serde(default)]
    pub office_data: Option<Value>,
    #[serde(default)]
    pub primeiro_cliente_data: Option<Value>,
    #[serde(default)]
    pub fiscal_data: Option<Value>,
    #[serde(default)]
    pub bancaria_data: Option<Value>,
    #[serde(default)]
    pub equipe_data: Option<Value>,
    /// Epoch milliseconds of the last write.
    #[serde(default)]
    pub timestamp: i64,
}

impl OnboardingData {
    /// True if the record is older than `ttl_ms` relative to `now_ms`.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) > ttl_ms
    }

    pub fn has_progress(&self) -> bool {
        self.current_step > 0
            || self.office_data.is_some()
            || self.primeiro_cliente_data.is_some()
            || self.fiscal_data.is_some()
            || self.bancaria_data.is_some()
            || self.equipe_data.is_some()
    }

    /// Shallow-merge `patch` into this record.
    ///
    /// Absent patch fields keep the current value; a payload patched with JSON
    /// `null` is cleared. The timestamp is not touched here.
    pub fn merge(&mut self, patch: OnboardingPatch) {
        if let Some(step) = patch.current_step {
            self.current_step = step;
        }
        merge_payload(&mut self.office_data, patch.office_data);
        merge_payload(&mut self.primeiro_cliente_data, patch.primeiro_cliente_data);
        merge_payload(&mut self.fiscal_data, patch.fiscal_data);
        merge_payload(&mut self.bancaria_data, patch.bancaria_data);
        merge_payload(&mut self.equipe_data, patch.equipe_data);
    }
}

fn merge_payload(slot: &mut Option<Value>, patch: Option<Value>) {
    match patch {
        None => {}
        Some(Value::Null) => *slot = None,
        Some(value) => *slot = Some(value),
    }
}

/// Partial update of [`OnboardingData`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPatch {
    #[serde(default)]
    pub current_step: Option<u32>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub office_data: Option<Value>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub primeiro_cliente_data: Option<Value>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub fiscal_data: Option<Value>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub bancaria_data: Option<Value>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub equipe_data: Option<Value>,
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)` so it clears the
/// payload on merge; a missing field stays `None` through `default`.
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl OnboardingPatch {
    pub fn step(step: u32) -> Self {
        Self {
            current_step: Some(step),
            ..Default::default()
        }
    }
}
