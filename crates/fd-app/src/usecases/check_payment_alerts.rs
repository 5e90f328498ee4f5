use std::sync::Arc;

use fd_core::alert::NewAlert;
use fd_core::ids::AlertId;
use fd_core::notification::Notification;
use fd_core::ports::{BackendPort, NotificationPort};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::AlertProducerError;
use crate::alerts::AlertRegistry;
use crate::loading::LoadingRegistry;

pub const PAYMENT_CHECK_RPC: &str = "check_payment_alerts";
pub const PAYMENT_CHECK_LOADING_KEY: &str = "alerts:payment-check";

/// Use case for asking the backend which payments are due or late and
/// registering one alert per finding.
pub struct CheckPaymentAlerts {
    backend: Arc<dyn BackendPort>,
    alerts: AlertRegistry,
    loading: LoadingRegistry,
    notifier: Arc<dyn NotificationPort>,
}

impl CheckPaymentAlerts {
    pub fn new(
        backend: Arc<dyn BackendPort>,
        alerts: AlertRegistry,
        loading: LoadingRegistry,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            backend,
            alerts,
            loading,
            notifier,
        }
    }

    /// Run the payment check, optionally restricted to one client.
    ///
    /// Returns the ids of the alerts added to the registry.
    #[tracing::instrument(name = "usecase.check_payment_alerts.execute", skip(self))]
    pub async fn execute(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<AlertId>, AlertProducerError> {
        let args = match client_id {
            Some(id) => json!({ "client_id": id }),
            None => json!({}),
        };

        let found = self
            .loading
            .execute_with_loading(PAYMENT_CHECK_LOADING_KEY, async {
                let payload = self.backend.rpc(PAYMENT_CHECK_RPC, args).await?;
                into_new_alerts(payload)
            })
            .await
            .map_err(|err| {
                self.notifier.notify(Notification::destructive(
                    "Erro ao verificar pagamentos",
                    err.to_string(),
                ));
                err
            })?;

        let ids: Vec<AlertId> = found
            .into_iter()
            .map(|new_alert| self.alerts.add_alert(new_alert))
            .collect();
        info!(added = ids.len(), "payment check finished");
        Ok(ids)
    }
}

fn into_new_alerts(payload: Value) -> Result<Vec<NewAlert>, AlertProducerError> {
    let items = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(AlertProducerError::Decode(format!(
                "expected an array of alerts, got {other}"
            )))
        }
    };

    let total = items.len();
    let alerts: Vec<NewAlert> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<NewAlert>(item) {
            Ok(alert) => Some(alert),
            Err(err) => {
                warn!(error = %err, "skipping malformed payment alert");
                None
            }
        })
        .collect();
    debug!(total, parsed = alerts.len(), "payment check payload decoded");
    Ok(alerts)
}
