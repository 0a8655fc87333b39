//! Recurring runs driven by `tokio-cron-scheduler`.
//!
//! The cron job fires once a day; the run-state interval guard decides
//! whether a source actually runs on that day.

use std::sync::Arc;

use chrono::{NaiveTime, Timelike};
use pricefeed_core::{AppConfig, SiteProfile};
use pricefeed_runner::RunOptions;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::run::{build_coordinator, log_summaries, Coordinator};

/// Six-field cron expression (seconds first) firing daily at `time` UTC.
pub(crate) fn daily_cron(time: NaiveTime) -> String {
    format!("0 {} {} * * *", time.minute(), time.hour())
}

/// Start the scheduler and block until Ctrl-C.
///
/// A run already in progress when the signal arrives is not interrupted;
/// the scheduler is shut down once it stops firing new jobs.
///
/// # Errors
///
/// Returns an error if profiles or the coordinator cannot be built, or the
/// scheduler fails to start or stop.
pub(crate) async fn run_schedule(
    config: &AppConfig,
    time: NaiveTime,
    every_days: u32,
) -> anyhow::Result<()> {
    let profiles = Arc::new(pricefeed_core::resolve_site_profiles(config)?);
    let options = RunOptions {
        interval_days: every_days,
        ..RunOptions::from_config(config, false)
    };
    let coordinator = Arc::new(build_coordinator(config, options)?);

    let mut scheduler = JobScheduler::new().await?;
    let cron = daily_cron(time);
    register_run_job(&scheduler, &cron, coordinator, profiles).await?;
    scheduler.start().await?;

    tracing::info!(
        cron = %cron,
        every_days,
        "scheduler started; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

async fn register_run_job(
    scheduler: &JobScheduler,
    cron: &str,
    coordinator: Arc<Coordinator>,
    profiles: Arc<Vec<SiteProfile>>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let coordinator = Arc::clone(&coordinator);
        let profiles = Arc::clone(&profiles);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled run");
            let summaries = coordinator.run_all(&profiles).await;
            log_summaries(&summaries);
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
