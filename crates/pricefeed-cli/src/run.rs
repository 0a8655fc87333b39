//! One-shot runs over every configured source.

use pricefeed_core::AppConfig;
use pricefeed_runner::{BackendClient, RunCoordinator, RunOptions, RunStateStore, RunSummary};
use pricefeed_scraper::HtmlLauncher;

pub(crate) type Coordinator = RunCoordinator<HtmlLauncher, BackendClient>;

/// Wire the HTML driver, backend client, and run-state file from `config`.
///
/// # Errors
///
/// Returns an error if the backend HTTP client cannot be constructed.
pub(crate) fn build_coordinator(
    config: &AppConfig,
    options: RunOptions,
) -> anyhow::Result<Coordinator> {
    let launcher = HtmlLauncher::from_config(config);
    let submitter = BackendClient::from_config(config)?;
    let state = RunStateStore::new(&config.state_path);
    Ok(RunCoordinator::new(launcher, submitter, state, options))
}

/// Run every source immediately, bypassing the interval guard.
///
/// # Errors
///
/// Returns an error if the site profiles cannot be resolved or the
/// coordinator cannot be built. Per-source faults only lower the counts.
pub(crate) async fn run_once(config: &AppConfig) -> anyhow::Result<()> {
    let profiles = pricefeed_core::resolve_site_profiles(config)?;
    let coordinator = build_coordinator(config, RunOptions::from_config(config, true))?;

    tracing::info!(
        sources = profiles.len(),
        backend = %config.backend_url,
        "manual run starting"
    );
    let summaries = coordinator.run_all(&profiles).await;
    log_summaries(&summaries);
    Ok(())
}

pub(crate) fn log_summaries(summaries: &[RunSummary]) {
    let total: usize = summaries.iter().map(|s| s.products_scraped).sum();
    for summary in summaries {
        tracing::info!(
            identity = %summary.identity,
            status = ?summary.status,
            products_scraped = summary.products_scraped,
            "source finished"
        );
    }
    tracing::info!(sources = summaries.len(), total, "all sources finished");
}
