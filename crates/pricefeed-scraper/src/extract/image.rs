use std::sync::LazyLock;

use regex::Regex;

use pricefeed_core::ImageStrategy;

use crate::driver::PageElement;
use crate::error::ScraperError;
use crate::normalize::absolutize_url;

/// Lazy-load thumbnails append a resize directive after the real extension,
/// e.g. `abc.jpg_200x200q80.avif`.
static RESIZE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?\.(?:jpe?g|png))_.*$").expect("valid resize suffix regex")
});

/// The image picked for a listing, with the alt text of the element it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChosenImage {
    pub url: String,
    pub alt: Option<String>,
}

/// Recovers the canonical asset URL from a resized thumbnail URL.
pub(crate) fn strip_resize_suffix(url: &str) -> String {
    RESIZE_SUFFIX_RE.replace(url, "$1").into_owned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Unparsable image selectors count as "no image" so the listing still gets
/// the placeholder; any other lookup failure is a node fault.
fn tolerate_bad_selector<T: Default>(
    lookup: Result<T, ScraperError>,
) -> Result<T, ScraperError> {
    match lookup {
        Err(e @ ScraperError::InvalidSelector { .. }) => {
            tracing::debug!(error = %e, "image selector skipped");
            Ok(T::default())
        }
        other => other,
    }
}

/// Locates the listing image according to `strategy`.
///
/// `None` means nothing usable was found and the caller substitutes the
/// site's placeholder.
pub(crate) fn locate_image<E: PageElement>(
    node: &E,
    strategy: &ImageStrategy,
    base_url: &str,
) -> Result<Option<ChosenImage>, ScraperError> {
    match strategy {
        ImageStrategy::Direct { selector } => {
            let Some(img) = tolerate_bad_selector(node.find(selector))? else {
                return Ok(None);
            };
            let url = img
                .attr("src")
                .and_then(|src| absolutize_url(base_url, &src));
            Ok(url.map(|url| ChosenImage {
                url,
                alt: non_empty(img.attr("alt")),
            }))
        }
        ImageStrategy::Scan {
            selector,
            source_attributes,
            allow_patterns,
            first_party_cdns,
        } => {
            let mut chosen = None;
            for img in tolerate_bad_selector(node.find_all(selector))? {
                let raw = source_attributes
                    .iter()
                    .filter_map(|attr| non_empty(img.attr(attr)))
                    .find(|value| !value.to_ascii_lowercase().starts_with("data:"));
                let Some(url) = raw.and_then(|raw| absolutize_url(base_url, &raw)) else {
                    continue;
                };

                let lower = url.to_lowercase();
                if !allow_patterns
                    .iter()
                    .any(|pattern| lower.contains(&pattern.to_lowercase()))
                {
                    continue;
                }

                let first_party = first_party_cdns
                    .iter()
                    .any(|cdn| lower.contains(&cdn.to_lowercase()));
                chosen = Some(ChosenImage {
                    url: strip_resize_suffix(&url),
                    alt: non_empty(img.attr("alt")),
                });
                if first_party {
                    break;
                }
            }
            Ok(chosen)
        }
    }
}
