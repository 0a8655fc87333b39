//! A full run against a `wiremock` listing site and a `wiremock` backend.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricefeed_core::SiteProfile;
use pricefeed_runner::{
    BackendClient, RunCoordinator, RunOptions, RunStateStore, RunStatus,
};
use pricefeed_scraper::HtmlLauncher;

const PHONES_HTML: &str = r#"<!DOCTYPE html>
<html><body>
  <div data-component-type="s-search-result">
    <h2><a href="/dp/B1"><span>Apple iPhone 14</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$699</span></span>
  </div>
  <div data-component-type="s-search-result">
    <h2><a href="/dp/B2"><span>Samsung Galaxy S23</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$799</span></span>
  </div>
  <div data-component-type="s-search-result">
    <h2><a href="/dp/B3"><span>Xiaomi 13T</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$599</span></span>
  </div>
</body></html>"#;

#[tokio::test]
async fn run_submits_records_and_skips_same_day_rerun() {
    let site = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "smartphone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PHONES_HTML))
        .expect(1)
        .mount(&site)
        .await;
    // The other five categories hit wiremock's default 404 and are skipped.

    Mock::given(method("POST"))
        .and(path("/api/scraper/price"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&backend)
        .await;

    let mut profile = SiteProfile::amazon();
    profile.base_url = site.uri();
    profile.scroll = None;

    let dir = tempfile::tempdir().expect("tempdir");
    let state_path = dir.path().join("last_run.json");
    let coordinator = RunCoordinator::new(
        HtmlLauncher::new(5, Vec::new(), 0, 0),
        BackendClient::new(&format!("{}/api/scraper/price", backend.uri()), 5)
            .expect("backend client"),
        RunStateStore::new(&state_path),
        RunOptions {
            interval_days: 2,
            ignore_interval: false,
            submit_delay: Duration::ZERO,
        },
    );

    let first = coordinator.run(&profile).await;
    assert_eq!(first.status, RunStatus::Success);
    assert_eq!(first.products_scraped, 3);

    let second = coordinator.run(&profile).await;
    assert_eq!(second.status, RunStatus::Skipped);
    assert_eq!(second.products_scraped, 0);

    let state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert!(state["amazon_selenium"].is_string());
}

#[tokio::test]
async fn backend_rejections_leave_count_at_zero_but_record_the_run() {
    let site = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "smartphone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PHONES_HTML))
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .expect(3)
        .mount(&backend)
        .await;

    let mut profile = SiteProfile::amazon();
    profile.base_url = site.uri();
    profile.scroll = None;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = RunStateStore::new(dir.path().join("last_run.json"));
    let coordinator = RunCoordinator::new(
        HtmlLauncher::new(5, Vec::new(), 0, 0),
        BackendClient::new(&backend.uri(), 5).expect("backend client"),
        store.clone(),
        RunOptions {
            interval_days: 2,
            ignore_interval: true,
            submit_delay: Duration::ZERO,
        },
    );

    let summary = coordinator.run(&profile).await;
    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.products_scraped, 0);
    assert!(store.last_run("amazon_selenium").is_some());
}
