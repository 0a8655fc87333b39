//! Integration tests for `HtmlPageDriver` and a full category crawl over it.
//!
//! Every test stands up a local `wiremock` server; no real network traffic
//! is made.

use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricefeed_core::{Category, SiteProfile};
use pricefeed_scraper::{
    scrape_category, DriverLauncher, HtmlLauncher, HtmlPageDriver, ListingStatus, PageDriver,
    PageElement, ScraperError,
};

const RESULTS_HTML: &str = r#"<!DOCTYPE html>
<html><body>
  <div data-component-type="s-search-result" data-asin="B0A">
    <h2><a href="/dp/B0A"><span>Apple iPhone 14</span></a></h2>
    <span class="a-price"><span class="a-price-whole">699.</span><span class="a-offscreen">$699.00</span></span>
    <img class="s-image" src="//m.media-amazon.com/images/I/a.jpg" alt="iPhone 14 Midnight">
  </div>
  <div data-component-type="s-search-result" data-asin="B0B">
    <h2><a href="/dp/B0B"><span>Refurbished phone, price on request</span></a></h2>
  </div>
  <div data-component-type="s-search-result" data-asin="B0C">
    <h2><a href="/dp/B0C"><span>Samsung Galaxy S24 Ultra</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$1,199.99</span></span>
  </div>
</body></html>"#;

async fn driver(max_retries: u32) -> HtmlPageDriver {
    HtmlLauncher::new(5, vec!["pricefeed-test/0.1".to_owned()], max_retries, 0)
        .launch()
        .await
        .expect("failed to launch test driver")
}

/// The Amazon-shaped profile pointed at the mock server, without scroll
/// pauses.
fn local_profile(server: &MockServer) -> SiteProfile {
    let mut profile = SiteProfile::amazon();
    profile.base_url = server.uri();
    profile.scroll = None;
    profile
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_sends_browser_headers_and_exposes_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(header_exists("accept-language"))
        .and(header("user-agent", "pricefeed-test/0.1"))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(0).await;
    let url = format!("{}/s?k=smartphone", server.uri());
    driver.load(&url).await.expect("load should succeed");

    assert_eq!(driver.current_url().await.unwrap(), url);
    assert!(driver
        .page_source()
        .await
        .unwrap()
        .contains("Samsung Galaxy S24 Ultra"));

    let nodes = driver
        .find_all(r#"[data-component-type="s-search-result"]"#)
        .await
        .unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[1].attr("data-asin").as_deref(), Some("B0B"));
}

#[tokio::test]
async fn load_follows_redirects_and_reports_final_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/punish/captcha", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/punish/captcha"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>slide to verify</body></html>"),
        )
        .mount(&server)
        .await;

    let mut driver = driver(0).await;
    driver
        .load(&format!("{}/catalog/?q=laptop", server.uri()))
        .await
        .unwrap();

    assert_eq!(
        driver.current_url().await.unwrap(),
        format!("{}/punish/captcha", server.uri())
    );
}

#[tokio::test]
async fn load_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_HTML))
        .mount(&server)
        .await;

    let mut driver = driver(2).await;
    let result = driver.load(&format!("{}/s?k=laptop", server.uri())).await;

    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
}

#[tokio::test]
async fn load_does_not_retry_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(3).await;
    let result = driver.load(&format!("{}/s?k=tablet", server.uri())).await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 404, .. })),
        "expected UnexpectedStatus(404), got: {result:?}"
    );
}

#[tokio::test]
async fn load_reports_rate_limit_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(0).await;
    let result = driver.load(&format!("{}/s?k=airpods", server.uri())).await;

    assert!(
        matches!(
            result,
            Err(ScraperError::RateLimited {
                retry_after_secs: 17,
                ..
            })
        ),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn load_rejects_malformed_url_without_request() {
    let mut driver = driver(3).await;
    let result = driver.load("not a url").await;
    assert!(matches!(result, Err(ScraperError::Driver(_))));
}

// ---------------------------------------------------------------------------
// Category crawl over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_category_over_http_extracts_priced_listings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "smartphone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let profile = local_profile(&server);
    let mut driver = driver(0).await;
    let report = scrape_category(&mut driver, &profile, "Phone", 20)
        .await
        .expect("crawl should succeed");

    assert_eq!(report.status, ListingStatus::Listed { nodes: 3 });
    assert_eq!(report.rejected, 1);
    assert_eq!(report.records.len(), 2);

    let iphone = &report.records[0];
    assert_eq!(iphone.name, "Apple iPhone 14");
    assert_eq!(iphone.price, 699);
    assert_eq!(iphone.brand, "Apple");
    assert_eq!(iphone.category, Category::Phone);
    assert_eq!(iphone.url, format!("{}/dp/B0A", server.uri()));
    assert_eq!(iphone.image, "https://m.media-amazon.com/images/I/a.jpg");
    assert_eq!(iphone.description, "iPhone 14 Midnight");

    let galaxy = &report.records[1];
    assert_eq!(galaxy.price, 119_999);
    assert_eq!(galaxy.brand, "Samsung");
    assert_eq!(galaxy.image, profile.placeholder_image);
}

#[tokio::test]
async fn scrape_category_detects_captcha_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/errors/captcha", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/errors/captcha"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Type the characters you see</body></html>"),
        )
        .mount(&server)
        .await;

    let mut driver = driver(0).await;
    let report = scrape_category(&mut driver, &local_profile(&server), "Speaker", 20)
        .await
        .unwrap();

    assert_eq!(report.status, ListingStatus::Blocked);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn scrape_category_propagates_page_load_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut driver = driver(0).await;
    let result = scrape_category(&mut driver, &local_profile(&server), "Laptop", 20).await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 403, .. })),
        "expected UnexpectedStatus(403), got: {result:?}"
    );
}
