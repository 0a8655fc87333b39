//! Per-site crawl configuration.
//!
//! Everything that differs between sources (URLs, selector fallback chains,
//! brand keywords, scroll behaviour) lives in a [`SiteProfile`] so a site can
//! be retargeted by editing data instead of control flow. Built-in profiles
//! cover both sources; `PRICEFEED_SITES_PATH` may point at a YAML file that
//! replaces them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::Category;
use crate::{AppConfig, ConfigError};

/// How the listing image is located inside one listing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageStrategy {
    /// A single selector whose `src` is taken as-is (after URL normalization).
    Direct { selector: String },
    /// Walk every element matched by `selector`, reading `source_attributes`
    /// in priority order and keeping URLs that match `allow_patterns`.
    /// A URL containing one of `first_party_cdns` ends the walk.
    Scan {
        selector: String,
        source_attributes: Vec<String>,
        allow_patterns: Vec<String>,
        first_party_cdns: Vec<String>,
    },
}

/// Search URL used when a listing carries no resolvable link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFallback {
    pub url: String,
    pub param: String,
    /// The name is cut to this many characters before it is encoded.
    pub max_chars: usize,
}

/// Heuristics that tell an anti-bot page apart from an empty result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMarkers {
    #[serde(default)]
    pub page_text: Vec<String>,
    #[serde(default)]
    pub url: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollMode {
    /// Advance `step_px` at a time until the document height is reached.
    FixedStep { step_px: u64 },
    /// Split the document height into `steps` equal increments.
    Divided { steps: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPhase {
    BeforeDiscovery,
    /// Scroll once listings are found, then discover them again because
    /// scrolling may detach the earlier handles.
    AfterDiscovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPlan {
    pub mode: ScrollMode,
    pub phase: ScrollPhase,
    pub pause_ms: u64,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Run identity: the key under which the last-run timestamp is stored.
    pub identity: String,
    /// Written to the `source` and `website` fields of every record.
    pub display_name: String,
    pub base_url: String,
    pub categories: BTreeMap<Category, String>,
    pub listing_selectors: Vec<String>,
    /// A selector must match strictly more nodes than this to be trusted.
    #[serde(default = "default_min_listing_matches")]
    pub min_listing_matches: usize,
    pub name_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
    #[serde(default)]
    pub price_whole_selectors: Vec<String>,
    #[serde(default)]
    pub price_text_selectors: Vec<String>,
    pub image: ImageStrategy,
    pub brands: Vec<String>,
    pub placeholder_image: String,
    #[serde(default)]
    pub search_fallback: Option<SearchFallback>,
    #[serde(default)]
    pub block_markers: BlockMarkers,
    #[serde(default)]
    pub scroll: Option<ScrollPlan>,
    pub max_products: usize,
}

fn default_min_listing_matches() -> usize {
    2
}

impl SiteProfile {
    /// Resolves a category label to its typed category and search path.
    ///
    /// Returns `None` for labels outside the fixed enumeration and for
    /// categories this site has no path for.
    #[must_use]
    pub fn resolve_category(&self, label: &str) -> Option<(Category, &str)> {
        let category = label.parse::<Category>().ok()?;
        self.categories
            .get(&category)
            .map(|path| (category, path.as_str()))
    }

    /// Absolute listing-page URL for `path`.
    #[must_use]
    pub fn listing_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Amazon-shaped search results.
    #[must_use]
    pub fn amazon() -> Self {
        Self {
            identity: "amazon_selenium".to_owned(),
            display_name: "Amazon".to_owned(),
            base_url: "https://www.amazon.com".to_owned(),
            categories: category_paths(&[
                (Category::Phone, "/s?k=smartphone"),
                (Category::Laptop, "/s?k=laptop"),
                (Category::Headphone, "/s?k=headphones"),
                (Category::Tablet, "/s?k=tablet"),
                (Category::Airpod, "/s?k=airpods"),
                (Category::Speaker, "/s?k=bluetooth+speaker"),
            ]),
            listing_selectors: strings(&[
                r#"[data-component-type="s-search-result"]"#,
                ".s-result-item[data-asin]",
                ".s-card-container",
            ]),
            min_listing_matches: default_min_listing_matches(),
            name_selectors: strings(&["h2 a span", "h2 span", ".a-size-medium", ".a-size-base-plus"]),
            link_selectors: strings(&["h2 a", "a.a-link-normal"]),
            price_whole_selectors: strings(&[".a-price-whole"]),
            price_text_selectors: strings(&[".a-price .a-offscreen"]),
            image: ImageStrategy::Direct {
                selector: "img.s-image".to_owned(),
            },
            brands: strings(&[
                "Apple", "Samsung", "Xiaomi", "HP", "Dell", "Sony", "Logitech", "Infinix",
                "Techno", "Realme", "Oppo", "Vivo", "Anker", "Bose",
            ]),
            placeholder_image: "https://via.placeholder.com/400x400.png?text=Amazon+Product"
                .to_owned(),
            search_fallback: Some(SearchFallback {
                url: "https://www.amazon.com/s".to_owned(),
                param: "k".to_owned(),
                max_chars: 50,
            }),
            block_markers: BlockMarkers {
                page_text: strings(&["api-services-support@amazon.com"]),
                url: strings(&["captcha"]),
            },
            scroll: Some(ScrollPlan {
                mode: ScrollMode::FixedStep { step_px: 500 },
                phase: ScrollPhase::BeforeDiscovery,
                pause_ms: 500,
                settle_ms: 1_000,
            }),
            max_products: 20,
        }
    }

    /// Daraz-shaped catalog grid.
    #[must_use]
    pub fn daraz() -> Self {
        Self {
            identity: "daraz_selenium".to_owned(),
            display_name: "Daraz".to_owned(),
            base_url: "https://www.daraz.pk".to_owned(),
            categories: category_paths(&[
                (Category::Phone, "/catalog/?q=smartphone"),
                (Category::Laptop, "/catalog/?q=laptop"),
                (Category::Headphone, "/catalog/?q=headphones"),
                (Category::Tablet, "/catalog/?q=tablet"),
                (Category::Airpod, "/catalog/?q=airpods"),
                (Category::Speaker, "/catalog/?q=bluetooth+speaker"),
            ]),
            listing_selectors: strings(&[
                r#"[data-qa-locator="product-item"]"#,
                ".gridItem--YqX5D",
                ".ant-col-5",
            ]),
            min_listing_matches: default_min_listing_matches(),
            name_selectors: strings(&[
                r#"a[href*="/products/"]"#,
                ".product-card__name, .title, .name",
            ]),
            link_selectors: strings(&["a"]),
            price_whole_selectors: Vec::new(),
            price_text_selectors: strings(&[
                r#".product-card__price-current, .ooOxS, [class*="price"]"#,
            ]),
            image: ImageStrategy::Scan {
                selector: "img".to_owned(),
                source_attributes: strings(&["src", "data-src", "data-lazysrc", "data-original"]),
                allow_patterns: strings(&[
                    ".jpg", ".jpeg", ".png", ".webp", ".avif", "slatic.net", "alicdn.com",
                    "lazcdn.com", "daraz.pk",
                ]),
                first_party_cdns: strings(&["slatic.net", "alicdn.com", "lazcdn.com"]),
            },
            brands: strings(&[
                "Apple", "Samsung", "Xiaomi", "HP", "Dell", "Sony", "Logitech", "Infinix",
                "Techno", "Realme", "Oppo", "Vivo",
            ]),
            placeholder_image: "https://via.placeholder.com/400x400.png?text=Product+Image"
                .to_owned(),
            search_fallback: Some(SearchFallback {
                url: "https://www.daraz.pk/catalog/".to_owned(),
                param: "q".to_owned(),
                max_chars: 50,
            }),
            block_markers: BlockMarkers {
                page_text: Vec::new(),
                url: strings(&["captcha"]),
            },
            scroll: Some(ScrollPlan {
                mode: ScrollMode::Divided { steps: 5 },
                phase: ScrollPhase::AfterDiscovery,
                pause_ms: 500,
                settle_ms: 500,
            }),
            max_products: 2,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_owned()).collect()
}

fn category_paths(pairs: &[(Category, &str)]) -> BTreeMap<Category, String> {
    pairs
        .iter()
        .map(|(category, path)| (*category, (*path).to_owned()))
        .collect()
}

/// The profiles used when no sites file is configured, in run order.
#[must_use]
pub fn builtin_profiles() -> Vec<SiteProfile> {
    vec![SiteProfile::daraz(), SiteProfile::amazon()]
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteProfile>,
}

/// Load and validate site profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_site_profiles(path: &Path) -> Result<Vec<SiteProfile>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile = serde_yaml::from_str(&content)?;
    validate_profiles(&sites_file.sites)?;

    Ok(sites_file.sites)
}

/// Profiles for this configuration: the sites file when one is configured,
/// otherwise [`builtin_profiles`].
///
/// # Errors
///
/// Propagates [`load_site_profiles`] failures.
pub fn resolve_site_profiles(config: &AppConfig) -> Result<Vec<SiteProfile>, ConfigError> {
    match &config.sites_path {
        Some(path) => load_site_profiles(path),
        None => Ok(builtin_profiles()),
    }
}

fn validate_profiles(profiles: &[SiteProfile]) -> Result<(), ConfigError> {
    if profiles.is_empty() {
        return Err(ConfigError::Validation(
            "at least one site must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for profile in profiles {
        if profile.identity.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site identity must be non-empty".to_string(),
            ));
        }

        if !seen.insert(profile.identity.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site identity: '{}'",
                profile.identity
            )));
        }

        if !is_http_url(&profile.base_url) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has a non-http base_url: {}",
                profile.identity, profile.base_url
            )));
        }

        if !is_http_url(&profile.placeholder_image) {
            return Err(ConfigError::Validation(format!(
                "site '{}' placeholder_image must be an absolute http(s) URL",
                profile.identity
            )));
        }

        if profile.listing_selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' needs at least one listing selector",
                profile.identity
            )));
        }

        if profile.name_selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' needs at least one name selector",
                profile.identity
            )));
        }

        if profile.max_products == 0 {
            return Err(ConfigError::Validation(format!(
                "site '{}' has max_products 0",
                profile.identity
            )));
        }
    }

    Ok(())
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
