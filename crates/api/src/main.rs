use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal;
use tracing::info;

use saw_tracker_api::app::{router, AppState};
use saw_tracker_api::config::Config;
use saw_tracker_api::jobs::{ExpiryDigestJob, JobScheduler, PoolMetricsJob};
use saw_tracker_api::middleware::{init_metrics, logging::init_logging};
use saw_tracker_api::services::admin_bootstrap::{bootstrap_admin, BootstrapOutcome};

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging);
    init_metrics().context("Failed to install metrics recorder")?;

    info!("Starting SAW Tracker API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;
    persistence::db::run_migrations(&pool).await?;

    match bootstrap_admin(&pool, &config.admin).await? {
        BootstrapOutcome::Created(id) => info!(user_id = %id, "Initial admin created"),
        BootstrapOutcome::AdminExists | BootstrapOutcome::NotConfigured => {}
    }

    let addr = config.socket_addr().context("Invalid server.host / server.port")?;
    let state = AppState::new(config, pool.clone())?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    if state.config.digest.enabled {
        scheduler.register(ExpiryDigestJob::new(
            pool,
            state.thresholds.clone(),
            state.email.clone(),
            state.config.digest.clone(),
            state.config.thresholds.timezone_offset_hours,
        ));
    }
    info!(jobs = ?scheduler.job_names(), "Starting background jobs");
    scheduler.start();

    let app = router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
