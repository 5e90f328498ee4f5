//! Alert domain models
//!
//! Alerts are produced by fiscal deadline checks, document processing and
//! payment checks, and surfaced to the user until acknowledged. They live in
//! memory only; see `fd_app::alerts::AlertRegistry` for the lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AlertId;

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Deadline (fiscal obligation due date)
    Prazo,
    /// Divergence between declared and computed values
    Divergencia,
    /// Document pending or processed
    Documento,
    Fiscal,
    Info,
}

/// Alert priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Alta,
    Media,
    Baixa,
}

/// Action offered alongside an alert.
///
/// `action` is an identifier the consumer maps to a handler (a route, a
/// command name); the core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    pub label: String,
    pub action: String,
}

/// Alert as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    #[serde(default)]
    pub is_acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<AlertAction>>,
}

impl Alert {
    /// Build an alert from producer input, stamping identity and creation date.
    pub fn from_new(new_alert: NewAlert, id: AlertId, date: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new_alert.title,
            message: new_alert.message,
            alert_type: new_alert.alert_type,
            priority: new_alert.priority,
            date,
            expiration_date: new_alert.expiration_date,
            related_id: new_alert.related_id,
            is_acknowledged: false,
            actions: new_alert.actions,
        }
    }

    /// Whether `expiration_date` lies strictly before `now`.
    ///
    /// Alerts without an expiration date never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp < now)
    }
}

/// Producer input for a new alert: an [`Alert`] without identity, creation
/// date and acknowledgement flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_id: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<AlertAction>>,
}

impl NewAlert {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        alert_type: AlertType,
        priority: AlertPriority,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            alert_type,
            priority,
            expiration_date: None,
            related_id: None,
            actions: None,
        }
    }

    pub fn with_expiration(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn with_related_id(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }

    pub fn with_action(mut self, label: impl Into<String>, action: impl Into<String>) -> Self {
        self.actions.get_or_insert_with(Vec::new).push(AlertAction {
            label: label.into(),
            action: action.into(),
        });
        self
    }
}
