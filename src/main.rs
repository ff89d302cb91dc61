//! Wiring & DI. Entry point: load config, bootstrap adapters, run every user's check-in once.
//! No business logic here; the pipeline lives in the use cases.

use buaa_report::adapters::portal::HttpPortal;
use buaa_report::adapters::push::HttpPushGateway;
use buaa_report::ports::{PortalGateway, PushGateway};
use buaa_report::shared::config::AppConfig;
use buaa_report::usecases::{Notifier, ReportService};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let config_path = AppConfig::path();
    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(
        path = %config_path.display(),
        users = cfg.users.len(),
        "configuration loaded"
    );
    if cfg.users.is_empty() {
        warn!("no users configured; nothing to do");
        return Ok(());
    }

    let timeout = cfg.http_timeout_or_default();
    let base_url = cfg.portal_base_url_or_default();
    info!(
        portal = %base_url,
        timeout_secs = timeout.as_secs(),
        "HTTP clients ready"
    );

    // --- Adapters ---
    let portal: Arc<dyn PortalGateway> =
        Arc::new(HttpPortal::new(base_url, timeout).map_err(|e| anyhow::anyhow!("{}", e))?);
    let push: Arc<dyn PushGateway> =
        Arc::new(HttpPushGateway::new(timeout).map_err(|e| anyhow::anyhow!("{}", e))?);

    // --- Services ---
    let notifier = Arc::new(Notifier::new(push));
    let service = ReportService::new(portal, notifier);

    // Per-user failures are reported through logs and pushes, not the exit code.
    let summary = service.run_all(cfg.users).await;
    info!(total = summary.total(), "run complete");

    Ok(())
}
