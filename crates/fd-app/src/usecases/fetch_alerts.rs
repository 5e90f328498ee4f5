use std::sync::Arc;

use fd_core::alert::Alert;
use fd_core::notification::Notification;
use fd_core::ports::{BackendPort, NotificationPort};
use serde_json::Value;
use tracing::{info, warn};

use super::AlertProducerError;
use crate::alerts::AlertRegistry;
use crate::loading::LoadingRegistry;

pub const ALERTS_TABLE: &str = "alerts";
pub const FETCH_ALERTS_LOADING_KEY: &str = "alerts:fetch";

/// Use case for replacing the alert registry with the alerts stored remotely.
pub struct FetchAlerts {
    backend: Arc<dyn BackendPort>,
    alerts: AlertRegistry,
    loading: LoadingRegistry,
    notifier: Arc<dyn NotificationPort>,
}

impl FetchAlerts {
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

    /// Fetch every alert row and replace the registry contents.
    ///
    /// Rows that do not parse as alerts are skipped. On a backend failure the
    /// registry is left untouched and the user gets a destructive toast.
    /// Returns the number of alerts now held.
    #[tracing::instrument(name = "usecase.fetch_alerts.execute", skip(self))]
    pub async fn execute(&self) -> Result<usize, AlertProducerError> {
        let rows = self
            .loading
            .execute_with_loading(FETCH_ALERTS_LOADING_KEY, async {
                self.backend
                    .select(ALERTS_TABLE, &[])
                    .await
                    .map_err(AlertProducerError::from)
            })
            .await
            .map_err(|err| {
                self.notifier.notify(Notification::destructive(
                    "Erro ao carregar alertas",
                    err.to_string(),
                ));
                err
            })?;

        let alerts: Vec<Alert> = rows.into_iter().filter_map(parse_row).collect();
        let count = alerts.len();
        self.alerts.replace_alerts(alerts);
        info!(count, "alerts refreshed from backend");
        Ok(count)
    }
}

fn parse_row(row: Value) -> Option<Alert> {
    match serde_json::from_value::<Alert>(row) {
        Ok(alert) => Some(alert),
        Err(err) => {
            warn!(error = %err, "skipping malformed alert row");
            None
        }
    }
}
