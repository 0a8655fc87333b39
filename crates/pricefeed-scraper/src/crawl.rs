//! Category crawl: load one listing page, find the listing nodes, and run
//! the extractor over them.

use pricefeed_core::{BlockMarkers, Category, ProductRecord, ScrollPhase, SiteProfile};

use crate::driver::{PageDriver, PageElement};
use crate::error::ScraperError;
use crate::extract::extract_listing;
use crate::scroll::progressive_scroll;

/// Per-node faults beyond this many are counted but not logged.
const LOGGED_FAULT_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    /// Listing nodes were found; `nodes` is how many.
    Listed { nodes: usize },
    /// No listing nodes, and the page looks like an anti-bot interstitial.
    Blocked,
    NoResults,
    /// The label is not one of the site's categories. Nothing was loaded.
    UnknownCategory,
}

/// Outcome of crawling one category page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category_label: String,
    pub status: ListingStatus,
    pub records: Vec<ProductRecord>,
    /// Nodes dropped for a missing name or price.
    pub rejected: usize,
    /// Nodes whose extraction failed outright.
    pub faults: usize,
}

impl CategoryReport {
    fn empty(label: &str, status: ListingStatus) -> Self {
        Self {
            category_label: label.to_owned(),
            status,
            records: Vec::new(),
            rejected: 0,
            faults: 0,
        }
    }
}

/// Returns `true` if the page source or URL carries one of `markers`.
#[must_use]
pub fn matches_block_markers(source: &str, url: &str, markers: &BlockMarkers) -> bool {
    markers.page_text.iter().any(|m| source.contains(m.as_str()))
        || markers.url.iter().any(|m| url.contains(m.as_str()))
}

/// Runs the profile's listing selectors in order and keeps the first one
/// that matches more than `min_listing_matches` nodes.
///
/// A selector with only a handful of matches is usually hitting page chrome
/// rather than the result grid, so it is passed over.
async fn discover_listings<D: PageDriver>(driver: &D, profile: &SiteProfile) -> Vec<D::Element> {
    for selector in &profile.listing_selectors {
        match driver.find_all(selector).await {
            Ok(nodes) if nodes.len() > profile.min_listing_matches => {
                tracing::debug!(selector = %selector, count = nodes.len(), "listing selector matched");
                return nodes;
            }
            Ok(nodes) => {
                tracing::debug!(
                    selector = %selector,
                    count = nodes.len(),
                    "listing selector below threshold"
                );
            }
            Err(e) => {
                tracing::warn!(selector = %selector, error = %e, "listing selector failed");
            }
        }
    }
    Vec::new()
}

async fn scroll_softly<D: PageDriver>(driver: &mut D, profile: &SiteProfile) {
    let Some(plan) = &profile.scroll else {
        return;
    };
    if let Err(e) = progressive_scroll(driver, plan).await {
        tracing::warn!(
            site = %profile.identity,
            error = %e,
            "progressive scroll failed; continuing"
        );
    }
}

/// Tells a block page apart from an empty result grid.
async fn classify_empty<D: PageDriver>(
    driver: &D,
    profile: &SiteProfile,
    label: &str,
) -> ListingStatus {
    let source = driver.page_source().await.unwrap_or_default();
    let url = driver.current_url().await.unwrap_or_default();

    if matches_block_markers(&source, &url, &profile.block_markers) {
        tracing::warn!(
            site = %profile.identity,
            category = %label,
            url = %url,
            "anti-bot page detected; no listings extracted"
        );
        ListingStatus::Blocked
    } else {
        tracing::info!(site = %profile.identity, category = %label, "no listings found");
        ListingStatus::NoResults
    }
}

fn extract_nodes<E: PageElement>(
    profile: &SiteProfile,
    category: Category,
    nodes: &[E],
    max_count: usize,
    report: &mut CategoryReport,
) {
    for (index, node) in nodes.iter().enumerate() {
        if report.records.len() >= max_count {
            break;
        }
        match extract_listing(profile, node, category) {
            Ok(Some(record)) => {
                tracing::debug!(name = %record.name, price = record.price, "listing extracted");
                report.records.push(record);
            }
            Ok(None) => report.rejected += 1,
            Err(e) => {
                report.faults += 1;
                if report.faults <= LOGGED_FAULT_LIMIT {
                    tracing::warn!(
                        site = %profile.identity,
                        category = %category,
                        node = index + 1,
                        error = %e,
                        "listing extraction failed"
                    );
                }
            }
        }
    }
}

/// Crawls one category page and extracts up to `max_count` records.
///
/// Missing selectors, empty pages, block pages, and per-node failures all
/// come back as a (possibly empty) report.
///
/// # Errors
///
/// Only a failure to load the listing page is returned as an error.
pub async fn scrape_category<D: PageDriver>(
    driver: &mut D,
    profile: &SiteProfile,
    category_label: &str,
    max_count: usize,
) -> Result<CategoryReport, ScraperError> {
    let Some((category, path)) = profile.resolve_category(category_label) else {
        tracing::warn!(site = %profile.identity, category = %category_label, "unknown category");
        return Ok(CategoryReport::empty(
            category_label,
            ListingStatus::UnknownCategory,
        ));
    };

    let url = profile.listing_url(path);
    tracing::info!(
        site = %profile.identity,
        category = %category,
        url = %url,
        "scraping category"
    );
    driver.load(&url).await?;

    let scroll_phase = profile.scroll.as_ref().map(|plan| plan.phase);
    if scroll_phase == Some(ScrollPhase::BeforeDiscovery) {
        scroll_softly(driver, profile).await;
    }

    let mut nodes = discover_listings(driver, profile).await;
    if nodes.is_empty() {
        let status = classify_empty(driver, profile, category.label()).await;
        return Ok(CategoryReport::empty(category.label(), status));
    }
    tracing::info!(
        site = %profile.identity,
        category = %category,
        count = nodes.len(),
        "listings found"
    );

    if scroll_phase == Some(ScrollPhase::AfterDiscovery) {
        scroll_softly(driver, profile).await;
        // Scrolling can detach the nodes found earlier.
        nodes = discover_listings(driver, profile).await;
        if nodes.is_empty() {
            tracing::info!(
                site = %profile.identity,
                category = %category,
                "listings vanished after scroll"
            );
            return Ok(CategoryReport::empty(
                category.label(),
                ListingStatus::NoResults,
            ));
        }
    }

    let mut report = CategoryReport::empty(
        category.label(),
        ListingStatus::Listed { nodes: nodes.len() },
    );
    extract_nodes(profile, category, &nodes, max_count, &mut report);

    tracing::info!(
        site = %profile.identity,
        category = %category,
        extracted = report.records.len(),
        rejected = report.rejected,
        faults = report.faults,
        "category complete"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
