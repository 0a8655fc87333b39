pub mod crawl;
pub mod driver;
pub mod error;
pub mod extract;
pub mod normalize;
mod fallback;
mod rate_limit;
pub mod scroll;

pub use crawl::{scrape_category, CategoryReport, ListingStatus};
pub use driver::html::{HtmlElement, HtmlLauncher, HtmlPageDriver};
pub use driver::{DriverLauncher, PageDriver, PageElement};
pub use error::ScraperError;
pub use extract::extract_listing;
pub use normalize::extract_price;
