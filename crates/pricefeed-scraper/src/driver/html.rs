//! Static-HTML page driver backed by `reqwest` and `scraper`.
//!
//! Each load is one GET with a browser-like header set and a user agent
//! drawn from a rotating pool. The document is kept as source text; queries
//! parse it on demand so no parsed tree is held across an await.

use std::time::Duration;

use async_trait::async_trait;
use pricefeed_core::AppConfig;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::{DriverLauncher, PageDriver, PageElement};
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Desktop browser user agents rotated across loads.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

/// Collapses runs of whitespace inside each text node, drops blank nodes,
/// and puts every remaining node on its own line.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(|run| run.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One element of a loaded page, held as its outer HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    outer_html: String,
}

impl HtmlElement {
    /// Wraps a fragment whose first element is the node of interest.
    #[must_use]
    pub fn from_fragment(outer_html: impl Into<String>) -> Self {
        Self {
            outer_html: outer_html.into(),
        }
    }

    /// Parses the fragment and runs `read` against its top element.
    fn with_root<T>(&self, read: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let fragment = Html::parse_fragment(&self.outer_html);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)?;
        Some(read(root))
    }

    fn select_descendants(&self, selector: &str) -> Result<Vec<Self>, ScraperError> {
        let selector = parse_selector(selector)?;
        let matches = self
            .with_root(|root| {
                root.select(&selector)
                    .filter(|el| el.id() != root.id())
                    .map(|el| Self::from_fragment(el.html()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(matches)
    }
}

impl PageElement for HtmlElement {
    fn find(&self, selector: &str) -> Result<Option<Self>, ScraperError> {
        Ok(self.select_descendants(selector)?.into_iter().next())
    }

    fn find_all(&self, selector: &str) -> Result<Vec<Self>, ScraperError> {
        self.select_descendants(selector)
    }

    fn text(&self) -> String {
        self.with_root(visible_text).unwrap_or_default()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.with_root(|root| root.value().attr(name).map(str::to_owned))
            .flatten()
    }
}

pub(crate) fn select_document(
    source: &str,
    selector: &str,
) -> Result<Vec<HtmlElement>, ScraperError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(source);
    Ok(document
        .select(&selector)
        .map(|el| HtmlElement::from_fragment(el.html()))
        .collect())
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    source: String,
}

/// [`PageDriver`] over plain HTTP. Suitable for server-rendered listings;
/// there is no script execution, so scrolling is a no-op.
pub struct HtmlPageDriver {
    client: Client,
    user_agents: Vec<String>,
    max_retries: u32,
    backoff_base_secs: u64,
    page: Option<LoadedPage>,
}

impl HtmlPageDriver {
    fn pick_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = rand::random_range(0..self.user_agents.len());
        self.user_agents.get(index).map(String::as_str)
    }

    fn page(&self) -> Result<&LoadedPage, ScraperError> {
        self.page.as_ref().ok_or(ScraperError::NoPageLoaded)
    }

    async fn fetch(&self, url: &str) -> Result<LoadedPage, ScraperError> {
        reqwest::Url::parse(url)
            .map_err(|e| ScraperError::Driver(format!("invalid URL \"{url}\": {e}")))?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let user_agent = self.pick_user_agent().map(str::to_owned);
            async move {
                let mut request = self
                    .client
                    .get(url)
                    .header(reqwest::header::ACCEPT, ACCEPT_HTML)
                    .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
                if let Some(ua) = &user_agent {
                    request = request.header(reqwest::header::USER_AGENT, ua);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        domain: host_of(url),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                let final_url = response.url().to_string();
                let source = response.text().await?;
                Ok(LoadedPage {
                    url: final_url,
                    source,
                })
            }
        })
        .await
    }
}

#[async_trait]
impl PageDriver for HtmlPageDriver {
    type Element = HtmlElement;

    async fn load(&mut self, url: &str) -> Result<(), ScraperError> {
        let page = self.fetch(url).await?;
        tracing::debug!(
            url = %page.url,
            bytes = page.source.len(),
            "page loaded"
        );
        self.page = Some(page);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<HtmlElement>, ScraperError> {
        select_document(&self.page()?.source, selector)
    }

    async fn page_source(&self) -> Result<String, ScraperError> {
        Ok(self.page()?.source.clone())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self.page()?.url.clone())
    }

    /// Static documents have no scrollable height, so progressive scrolling
    /// visits no offsets.
    async fn scroll_height(&self) -> Result<u64, ScraperError> {
        Ok(0)
    }

    async fn scroll_to(&mut self, _y: u64) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn close(self) -> Result<(), ScraperError> {
        Ok(())
    }
}

/// Builds an [`HtmlPageDriver`] per run.
#[derive(Debug, Clone)]
pub struct HtmlLauncher {
    timeout_secs: u64,
    user_agents: Vec<String>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HtmlLauncher {
    /// An empty `user_agents` list falls back to [`DEFAULT_USER_AGENTS`].
    #[must_use]
    pub fn new(
        timeout_secs: u64,
        user_agents: Vec<String>,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Self {
        let user_agents = if user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| (*s).to_owned()).collect()
        } else {
            user_agents
        };
        Self {
            timeout_secs,
            user_agents,
            max_retries,
            backoff_base_secs,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.page_load_timeout_secs,
            Vec::new(),
            config.fetch_max_retries,
            config.fetch_backoff_base_secs,
        )
    }
}

#[async_trait]
impl DriverLauncher for HtmlLauncher {
    type Driver = HtmlPageDriver;

    async fn launch(&self) -> Result<HtmlPageDriver, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(HtmlPageDriver {
            client,
            user_agents: self.user_agents.clone(),
            max_retries: self.max_retries,
            backoff_base_secs: self.backoff_base_secs,
            page: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <div class="card" data-asin="B0TEST">
          <h2><a href="/dp/B0TEST"><span>  Apple   iPhone 14 </span></a></h2>
          <span class="a-price"><span class="a-offscreen">$699</span></span>
          <img class="s-image" src="https://m.media-amazon.com/i/x.jpg" alt="iPhone 14">
        </div>
    "#;

    #[test]
    fn find_returns_first_descendant() {
        let card = HtmlElement::from_fragment(CARD);
        let link = card.find("h2 a").unwrap().expect("link present");
        assert_eq!(link.attr("href").as_deref(), Some("/dp/B0TEST"));
        assert!(card.find("table").unwrap().is_none());
    }

    #[test]
    fn find_excludes_the_element_itself() {
        let card = HtmlElement::from_fragment(CARD);
        assert!(card.find("div.card").unwrap().is_none());
    }

    #[test]
    fn text_collapses_whitespace_per_run() {
        let card = HtmlElement::from_fragment(CARD);
        let name = card.find("h2 span").unwrap().expect("name present");
        assert_eq!(name.text(), "Apple iPhone 14");
        assert_eq!(card.text(), "Apple iPhone 14\n$699");
    }

    #[test]
    fn attr_reads_top_element() {
        let card = HtmlElement::from_fragment(CARD);
        assert_eq!(card.attr("data-asin").as_deref(), Some("B0TEST"));
        assert!(card.attr("missing").is_none());
    }

    #[test]
    fn invalid_selector_is_reported() {
        let card = HtmlElement::from_fragment(CARD);
        let err = card.find("div[").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidSelector { .. }));
    }

    #[test]
    fn select_document_matches_in_order() {
        let doc = "<html><body><ul><li>a</li><li>b</li></ul></body></html>";
        let items = select_document(doc, "li").unwrap();
        let texts: Vec<String> = items.iter().map(PageElement::text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn launcher_falls_back_to_default_user_agents() {
        let launcher = HtmlLauncher::new(5, Vec::new(), 0, 0);
        assert_eq!(launcher.user_agents.len(), DEFAULT_USER_AGENTS.len());
    }

    #[tokio::test]
    async fn queries_before_load_fail() {
        let driver = HtmlLauncher::new(5, Vec::new(), 0, 0)
            .launch()
            .await
            .unwrap();
        assert!(matches!(
            driver.page_source().await,
            Err(ScraperError::NoPageLoaded)
        ));
        assert!(matches!(
            driver.find_all("div").await,
            Err(ScraperError::NoPageLoaded)
        ));
    }
}
