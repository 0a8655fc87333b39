//! Page-driver abstraction.
//!
//! The crawler only needs to load a URL, query the rendered document with CSS
//! selectors, read page source and URL, and scroll. Anything that can do that
//! (the bundled [`html::HtmlPageDriver`], a headless browser bridge, or a
//! test fake) plugs in behind [`PageDriver`].

pub mod html;

use async_trait::async_trait;

use crate::error::ScraperError;

/// A node in the loaded document.
///
/// Queries are scoped to the node's descendants.
pub trait PageElement: Sized + Send + Sync {
    /// First descendant matching `selector`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `selector` does not parse.
    fn find(&self, selector: &str) -> Result<Option<Self>, ScraperError>;

    /// Every descendant matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `selector` does not parse.
    fn find_all(&self, selector: &str) -> Result<Vec<Self>, ScraperError>;

    /// Visible text, one line per text run.
    fn text(&self) -> String;

    fn attr(&self, name: &str) -> Option<String>;
}

#[async_trait]
pub trait PageDriver: Send + Sync + Sized {
    type Element: PageElement;

    /// Navigates to `url`.
    ///
    /// # Errors
    ///
    /// Any failure to obtain the page: network, HTTP status, driver crash.
    async fn load(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Every element in the current document matching `selector`.
    ///
    /// # Errors
    ///
    /// [`ScraperError::NoPageLoaded`] before the first successful load, or
    /// [`ScraperError::InvalidSelector`].
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, ScraperError>;

    /// Full source of the current document.
    ///
    /// # Errors
    ///
    /// [`ScraperError::NoPageLoaded`] before the first successful load.
    async fn page_source(&self) -> Result<String, ScraperError>;

    /// URL of the current document after redirects.
    ///
    /// # Errors
    ///
    /// [`ScraperError::NoPageLoaded`] before the first successful load.
    async fn current_url(&self) -> Result<String, ScraperError>;

    /// Scrollable height of the current document in pixels.
    ///
    /// # Errors
    ///
    /// Driver-specific failures.
    async fn scroll_height(&self) -> Result<u64, ScraperError>;

    /// Scrolls the viewport to vertical offset `y`.
    ///
    /// # Errors
    ///
    /// Driver-specific failures.
    async fn scroll_to(&mut self, y: u64) -> Result<(), ScraperError>;

    /// Releases the driver.
    ///
    /// # Errors
    ///
    /// Driver-specific failures. Callers log and move on.
    async fn close(self) -> Result<(), ScraperError>;
}

/// Creates a fresh [`PageDriver`] for each run.
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    type Driver: PageDriver;

    /// # Errors
    ///
    /// Any failure to start the driver.
    async fn launch(&self) -> Result<Self::Driver, ScraperError>;
}
