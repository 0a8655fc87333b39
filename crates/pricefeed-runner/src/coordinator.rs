//! One run per source: interval check, crawl every category, submit, record.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use pricefeed_core::{AppConfig, SiteProfile};
use pricefeed_scraper::{scrape_category, DriverLauncher, PageDriver};
use serde::{Deserialize, Serialize};

use crate::state::RunStateStore;
use crate::submit::Submitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    /// The source ran within the interval; nothing was launched.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub identity: String,
    pub status: RunStatus,
    /// Records the backend confirmed.
    pub products_scraped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub interval_days: u32,
    /// Manual runs bypass the interval guard.
    pub ignore_interval: bool,
    /// Pause after every submission attempt.
    pub submit_delay: Duration,
}

impl RunOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig, ignore_interval: bool) -> Self {
        Self {
            interval_days: config.run_interval_days,
            ignore_interval,
            submit_delay: Duration::from_millis(config.submit_delay_ms),
        }
    }
}

/// Drives complete runs for one or more site profiles.
///
/// Each run owns a freshly launched page driver for its whole duration and
/// closes it before the run-state timestamp is written.
pub struct RunCoordinator<L, S> {
    launcher: L,
    submitter: S,
    state: RunStateStore,
    options: RunOptions,
}

impl<L, S> RunCoordinator<L, S>
where
    L: DriverLauncher,
    S: Submitter,
{
    pub fn new(launcher: L, submitter: S, state: RunStateStore, options: RunOptions) -> Self {
        Self {
            launcher,
            submitter,
            state,
            options,
        }
    }

    /// Runs every profile in order, one after the other.
    pub async fn run_all(&self, profiles: &[SiteProfile]) -> Vec<RunSummary> {
        let mut summaries = Vec::with_capacity(profiles.len());
        for profile in profiles {
            summaries.push(self.run(profile).await);
        }
        summaries
    }

    /// Runs `profile` now (local time).
    pub async fn run(&self, profile: &SiteProfile) -> RunSummary {
        self.run_at(profile, Local::now().naive_local()).await
    }

    /// Runs `profile` as of `now`.
    ///
    /// Never fails: launch, load, and submission faults are logged and only
    /// reduce the count. Unless skipped, the run is recorded at `now` even
    /// when nothing was delivered, so a failing source is not retried in a
    /// tight loop.
    pub async fn run_at(&self, profile: &SiteProfile, now: NaiveDateTime) -> RunSummary {
        let identity = profile.identity.as_str();
        let interval_days = if self.options.ignore_interval {
            0
        } else {
            self.options.interval_days
        };

        if !self.state.should_run(identity, interval_days, now.date()) {
            tracing::info!(identity, interval_days, "ran within interval; skipping");
            return RunSummary {
                identity: identity.to_owned(),
                status: RunStatus::Skipped,
                products_scraped: 0,
            };
        }

        tracing::info!(identity, site = %profile.display_name, "run starting");

        let products_scraped = match self.launcher.launch().await {
            Ok(mut driver) => {
                let submitted = self.crawl_and_submit(&mut driver, profile).await;
                if let Err(e) = driver.close().await {
                    tracing::warn!(identity, error = %e, "page driver did not close cleanly");
                }
                submitted
            }
            Err(e) => {
                tracing::error!(identity, error = %e, "failed to launch page driver");
                0
            }
        };

        if let Err(e) = self.state.mark_run_complete(identity, now) {
            tracing::error!(identity, error = %e, "failed to record run state");
        }

        tracing::info!(identity, products_scraped, "run complete");
        RunSummary {
            identity: identity.to_owned(),
            status: RunStatus::Success,
            products_scraped,
        }
    }

    async fn crawl_and_submit<D: PageDriver>(&self, driver: &mut D, profile: &SiteProfile) -> usize {
        let identity = profile.identity.as_str();
        let mut submitted = 0usize;

        for category in profile.categories.keys() {
            let report =
                match scrape_category(driver, profile, category.label(), profile.max_products)
                    .await
                {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!(
                            identity,
                            category = %category,
                            error = %e,
                            "category page failed to load; moving on"
                        );
                        continue;
                    }
                };

            for record in &report.records {
                match self.submitter.submit(record).await {
                    Ok(()) => {
                        submitted += 1;
                        tracing::debug!(identity, name = %record.name, "record submitted");
                    }
                    Err(e) => {
                        tracing::warn!(identity, name = %record.name, error = %e, "record not submitted");
                    }
                }
                tokio::time::sleep(self.options.submit_delay).await;
            }
        }

        submitted
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
