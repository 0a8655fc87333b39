//! Text, price, and URL normalization shared by every site extractor.

/// Brand assigned when no keyword from the site's brand list matches.
pub const GENERIC_BRAND: &str = "Generic";

/// Converts a raw price string to whole currency units by concatenating its
/// decimal digits in order.
///
/// Every non-digit is dropped, including decimal points, so
/// `"Rs. 45,999.00"` becomes `4_599_900`. This is intentional: listings on
/// the crawled sites carry no meaningful fractional part, and callers treat
/// `0` as "no usable price". Returns `0` when no digits remain or the digits
/// overflow `u64`.
#[must_use]
pub fn extract_price(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().unwrap_or(0)
}

/// Parses a "whole number" price element such as Amazon's `.a-price-whole`.
///
/// Only `.`, `,` and whitespace are removed; anything else (a currency
/// symbol, stray text) makes the value unusable and yields `0` so the caller
/// moves on to its text fallback.
#[must_use]
pub fn parse_whole_price(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<u64>().unwrap_or(0)
}

/// First `max_chars` characters of `s`.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// First non-blank line of `s`, trimmed.
#[must_use]
pub fn first_line(s: &str) -> &str {
    s.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Resolves a raw `href`/`src` value against `base_url`.
///
/// Scheme-relative values (`//host/...`) get `https:`; other values that are
/// not already `http(s)` URLs are treated as site-relative paths. Returns
/// `None` for blanks and for `data:`/`javascript:` URIs.
#[must_use]
pub fn absolutize_url(base_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("data:") || lower.starts_with("javascript:") {
        return None;
    }

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(raw.to_owned());
    }

    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }

    let base = base_url.trim_end_matches('/');
    if raw.starts_with('/') {
        Some(format!("{base}{raw}"))
    } else {
        Some(format!("{base}/{raw}"))
    }
}

/// First entry of `brands` found (case-insensitively) inside `name`, or
/// [`GENERIC_BRAND`].
#[must_use]
pub fn detect_brand(name: &str, brands: &[String]) -> String {
    let lower_name = name.to_lowercase();
    brands
        .iter()
        .find(|brand| lower_name.contains(&brand.to_lowercase()))
        .cloned()
        .unwrap_or_else(|| GENERIC_BRAND.to_owned())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
