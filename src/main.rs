use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use fd_bootstrap::{resolve_config, run_startup, start_payment_polling, wire_app};
use fd_core::config::AppConfig;
use fd_infra::{TimerScope, TracingNotifier};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fiscaldesk")]
#[command(about = "FiscalDesk client core: local state, alerts and onboarding", long_about = None)]
struct Cli {
    /// Config file path (defaults to <config dir>/fiscaldesk/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the startup sequence and exit, even when payment polling is configured
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config, using empty configuration: {err:#}");
            AppConfig::empty()
        }
    };

    fd_bootstrap::tracing::init_tracing_subscriber(&config.logging)?;

    let ctx = wire_app(config, Arc::new(TracingNotifier))?;
    let report = run_startup(&ctx).await;

    if let Some(error) = &report.alerts_error {
        warn!(%error, "alerts unavailable");
    }
    info!(
        onboarding_step = report.onboarding_step,
        alerts = ctx.alerts.len(),
        unacknowledged = ctx.alerts.get_unacknowledged_alerts().len(),
        "ready"
    );

    let timers = TimerScope::new();
    if cli.once || start_payment_polling(&ctx, &timers).is_none() {
        return Ok(());
    }

    info!("payment polling active, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!(cancelled = timers.cancel_all(), "shutting down");
    Ok(())
}
