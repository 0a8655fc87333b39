use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of electronics categories crawled on every source.
///
/// Declaration order is the crawl order; `Ord` follows it so a
/// `BTreeMap<Category, _>` iterates in the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Phone,
    Laptop,
    Headphone,
    Tablet,
    Airpod,
    Speaker,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Phone,
        Category::Laptop,
        Category::Headphone,
        Category::Tablet,
        Category::Airpod,
        Category::Speaker,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Phone => "Phone",
            Category::Laptop => "Laptop",
            Category::Headphone => "Headphone",
            Category::Tablet => "Tablet",
            Category::Airpod => "Airpod",
            Category::Speaker => "Speaker",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a label does not name one of the fixed categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// A product listing extracted from a category page, normalized for the
/// backend ingestion endpoint.
///
/// Serialized as a flat JSON object; the field names are the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Listing title, at most 100 characters. Never empty.
    pub name: String,
    /// Absolute product URL, or a search URL synthesized from the name.
    pub url: String,
    /// First brand keyword found in the name, or `"Generic"`.
    pub brand: String,
    pub category: Category,
    /// Absolute `http(s)` image URL; a fixed placeholder when unresolved.
    pub image: String,
    pub description: String,
    pub source: String,
    pub website: String,
    /// Positive price in whole currency units. Zero is never emitted.
    pub price: u64,
}
