//! Progressive scrolling to reveal lazily loaded listings.

use std::time::Duration;

use pricefeed_core::{ScrollMode, ScrollPlan};

use crate::driver::PageDriver;
use crate::error::ScraperError;

/// Scroll offsets visited for a document of `height` pixels.
///
/// An empty document yields no offsets.
#[must_use]
pub fn scroll_offsets(mode: ScrollMode, height: u64) -> Vec<u64> {
    if height == 0 {
        return Vec::new();
    }
    match mode {
        ScrollMode::FixedStep { step_px } => {
            let step = usize::try_from(step_px.max(1)).unwrap_or(usize::MAX);
            (0..height).step_by(step).collect()
        }
        ScrollMode::Divided { steps } => {
            let steps = u64::from(steps);
            (1..=steps).map(|i| i * height / steps).collect()
        }
    }
}

/// Scrolls through the page per `plan`, pausing after each step, then
/// returns to the top and waits for the page to settle.
///
/// # Errors
///
/// Propagates driver errors; callers treat them as non-fatal.
pub async fn progressive_scroll<D: PageDriver>(
    driver: &mut D,
    plan: &ScrollPlan,
) -> Result<(), ScraperError> {
    let height = driver.scroll_height().await?;
    let offsets = scroll_offsets(plan.mode, height);
    tracing::debug!(height, steps = offsets.len(), "progressive scroll");

    for offset in offsets {
        driver.scroll_to(offset).await?;
        tokio::time::sleep(Duration::from_millis(plan.pause_ms)).await;
    }

    driver.scroll_to(0).await?;
    tokio::time::sleep(Duration::from_millis(plan.settle_ms)).await;
    Ok(())
}
