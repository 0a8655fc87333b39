//! Listing-node field extraction.
//!
//! One pipeline serves every site: the per-site differences (selector
//! chains, image strategy, brand list, fallbacks) come from the
//! [`SiteProfile`]. Fields are resolved in a fixed order and the cheap
//! rejections (no name, no price) happen before any image work.

mod image;

use pricefeed_core::{Category, ProductRecord, SiteProfile};

use crate::driver::PageElement;
use crate::error::ScraperError;
use crate::fallback::first_match;
use crate::normalize::{
    absolutize_url, detect_brand, extract_price, first_line, parse_whole_price, truncate_chars,
};

use image::{locate_image, ChosenImage};

/// Maximum characters kept from a listing title.
pub const NAME_MAX_CHARS: usize = 100;

fn read_name<E: PageElement>(el: &E) -> Option<String> {
    let text = el.text();
    let line = first_line(&text);
    if line.is_empty() {
        el.attr("title").map(|title| first_line(&title).to_owned())
    } else {
        Some(line.to_owned())
    }
}

/// Search URL built from the listing name, or the site root when the profile
/// has no usable search fallback.
fn fallback_url(profile: &SiteProfile, name: &str) -> String {
    let Some(fallback) = &profile.search_fallback else {
        return profile.base_url.clone();
    };
    match reqwest::Url::parse(&fallback.url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair(&fallback.param, &truncate_chars(name, fallback.max_chars));
            url.into()
        }
        Err(e) => {
            tracing::debug!(url = %fallback.url, error = %e, "unparseable search fallback");
            profile.base_url.clone()
        }
    }
}

fn read_price<E: PageElement>(profile: &SiteProfile, node: &E) -> u64 {
    let whole = first_match(node, &profile.price_whole_selectors, |el| Some(el.text()))
        .map_or(0, |text| parse_whole_price(&text));
    if whole > 0 {
        return whole;
    }

    first_match(node, &profile.price_text_selectors, |el| Some(el.text()))
        .map_or(0, |text| extract_price(&text))
}

/// Turns one listing node into a [`ProductRecord`].
///
/// Returns `Ok(None)` when the node has no name or no positive price; those
/// are ordinary rejections (ads, out-of-stock items, layout chrome).
///
/// # Errors
///
/// Returns [`ScraperError`] when the driver fails while reading the node.
/// The crawler counts this as a fault for this node only.
pub fn extract_listing<E: PageElement>(
    profile: &SiteProfile,
    node: &E,
    category: Category,
) -> Result<Option<ProductRecord>, ScraperError> {
    let Some(name) = first_match(node, &profile.name_selectors, read_name) else {
        return Ok(None);
    };

    let url = first_match(node, &profile.link_selectors, |el| el.attr("href"))
        .and_then(|href| absolutize_url(&profile.base_url, &href))
        .unwrap_or_else(|| fallback_url(profile, &name));

    let price = read_price(profile, node);
    if price == 0 {
        return Ok(None);
    }

    let (image, alt) = match locate_image(node, &profile.image, &profile.base_url)? {
        Some(ChosenImage { url, alt }) => (url, alt),
        None => (profile.placeholder_image.clone(), None),
    };

    let brand = detect_brand(&name, &profile.brands);
    let description = alt.unwrap_or_else(|| name.clone());

    Ok(Some(ProductRecord {
        name: truncate_chars(&name, NAME_MAX_CHARS),
        url,
        brand,
        category,
        image,
        description,
        source: profile.display_name.clone(),
        website: profile.display_name.clone(),
        price,
    }))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
