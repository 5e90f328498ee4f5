//! Startup sequence and background jobs.

use std::sync::Arc;
use std::time::Duration;

use fd_app::AuthCleanupReport;
use fd_infra::{TimerId, TimerScope};
use tracing::{debug, info, warn};

use crate::wiring::AppContext;

/// What happened during [`run_startup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Set when inconsistent auth state was found and cleared.
    pub auth_recovered: Option<AuthCleanupReport>,
    pub onboarding_step: u32,
    pub onboarding_in_progress: bool,
    /// Number of alerts fetched, `None` without a backend or on failure.
    pub alerts_loaded: Option<usize>,
    pub alerts_error: Option<String>,
}

/// Bring the stores to their initial state.
///
/// 1. Clear auth state left in limbo by an interrupted sign-in or sign-out.
/// 2. Restore unexpired onboarding progress.
/// 3. Fetch alerts when a backend is configured.
///
/// Never fails: every step degrades on its own and is reflected in the report.
pub async fn run_startup(ctx: &AppContext) -> StartupReport {
    let mut report = StartupReport {
        auth_recovered: ctx.auth_cleanup.recover_if_in_limbo(),
        ..Default::default()
    };

    let onboarding = ctx.onboarding.load();
    report.onboarding_step = onboarding.current_step;
    report.onboarding_in_progress = onboarding.has_progress();

    if let Some(fetch) = ctx.fetch_alerts() {
        match fetch.execute().await {
            Ok(count) => report.alerts_loaded = Some(count),
            Err(err) => report.alerts_error = Some(err.to_string()),
        }
    } else {
        debug!("alert fetch skipped, no backend");
    }

    info!(
        auth_recovered = report.auth_recovered.is_some(),
        onboarding_step = report.onboarding_step,
        alerts = ?report.alerts_loaded,
        "startup finished"
    );
    report
}

/// Schedule the payment alert check on `timers`.
///
/// Returns `None` when polling is disabled (interval 0) or there is no
/// backend. The job stops when `timers` is dropped.
pub fn start_payment_polling(ctx: &AppContext, timers: &TimerScope) -> Option<TimerId> {
    let interval_secs = ctx.config.alerts.payment_check_interval_secs;
    if interval_secs == 0 {
        return None;
    }
    let Some(check) = ctx.check_payment_alerts() else {
        warn!("payment check interval set but no backend configured");
        return None;
    };

    let check = Arc::new(check);
    let id = timers.set_interval(Duration::from_secs(interval_secs), move || {
        let check = check.clone();
        async move {
            // failures are already logged and surfaced by the use case
            if let Ok(ids) = check.execute(None).await {
                debug!(added = ids.len(), "scheduled payment check done");
            }
        }
    });
    info!(interval_secs, "payment alert polling started");
    Some(id)
}
