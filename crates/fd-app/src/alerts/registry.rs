use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fd_core::alert::{Alert, AlertPriority, AlertType, NewAlert};
use fd_core::ids::AlertId;
use fd_core::notification::{Notification, NotificationLevel};
use fd_core::ports::{ClockPort, NotificationPort};
use tracing::debug;

/// In-memory collection of alerts, most recent first.
///
/// Cloning yields another handle to the same registry. The registry is
/// constructed once at startup and injected into its consumers.
///
/// Alerts are retained until removed or replaced: nothing is evicted when
/// `expiration_date` passes. Consumers that hide expired alerts use
/// [`unexpired_alerts`](Self::unexpired_alerts).
#[derive(Clone)]
pub struct AlertRegistry {
    alerts: Arc<Mutex<Vec<Alert>>>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
}

impl AlertRegistry {
    pub fn new(notifier: Arc<dyn NotificationPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            alerts: Arc::new(Mutex::new(Vec::new())),
            notifier,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Alert>> {
        self.alerts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new alert and return its id.
    ///
    /// High priority (`alta`) alerts are also pushed to the notification sink,
    /// once, after the alert is visible in the registry.
    pub fn add_alert(&self, new_alert: NewAlert) -> AlertId {
        let id = AlertId::new();
        let alert = Alert::from_new(new_alert, id.clone(), self.clock.now());
        let notification = (alert.priority == AlertPriority::Alta).then(|| {
            Notification::new(
                alert.title.clone(),
                alert.message.clone(),
                NotificationLevel::Destructive,
            )
        });

        debug!(
            alert_id = %id,
            alert_type = ?alert.alert_type,
            priority = ?alert.priority,
            "alert added"
        );
        self.lock().insert(0, alert);

        if let Some(notification) = notification {
            self.notifier.notify(notification);
        }
        id
    }

    /// Mark an alert as acknowledged. Idempotent; false if the id is unknown.
    pub fn acknowledge_alert(&self, id: &AlertId) -> bool {
        let mut alerts = self.lock();
        match alerts.iter_mut().find(|a| &a.id == id) {
            Some(alert) => {
                if !alert.is_acknowledged {
                    alert.is_acknowledged = true;
                    debug!(alert_id = %id, "alert acknowledged");
                }
                true
            }
            None => false,
        }
    }

    /// Remove an alert whether or not it was acknowledged.
    pub fn remove_alert(&self, id: &AlertId) -> bool {
        let mut alerts = self.lock();
        let before = alerts.len();
        alerts.retain(|a| &a.id != id);
        let removed = alerts.len() != before;
        if removed {
            debug!(alert_id = %id, "alert removed");
        }
        removed
    }

    /// Replace the whole collection, e.g. with a fresh fetch from the backend.
    ///
    /// Does not notify: replaced alerts were already announced by whoever
    /// produced them.
    pub fn replace_alerts(&self, mut alerts: Vec<Alert>) {
        alerts.sort_by(|a, b| b.date.cmp(&a.date));
        *self.lock() = alerts;
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().clone()
    }

    pub fn get(&self, id: &AlertId) -> Option<Alert> {
        self.lock().iter().find(|a| &a.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn filter_alerts_by_type(&self, alert_type: AlertType) -> Vec<Alert> {
        self.project(|a| a.alert_type == alert_type)
    }

    pub fn filter_alerts_by_priority(&self, priority: AlertPriority) -> Vec<Alert> {
        self.project(|a| a.priority == priority)
    }

    pub fn get_unacknowledged_alerts(&self) -> Vec<Alert> {
        self.project(|a| !a.is_acknowledged)
    }

    /// Alerts whose expiration date has not passed at `now`.
    pub fn unexpired_alerts(&self, now: DateTime<Utc>) -> Vec<Alert> {
        self.project(|a| !a.is_expired_at(now))
    }

    fn project(&self, predicate: impl Fn(&Alert) -> bool) -> Vec<Alert> {
        self.lock().iter().filter(|a| predicate(a)).cloned().collect()
    }
}
