//! Integration tests for `BackendClient` against a `wiremock` backend.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricefeed_core::{Category, ProductRecord};
use pricefeed_runner::{BackendClient, RunnerError, Submitter};

fn record() -> ProductRecord {
    ProductRecord {
        name: "Samsung Galaxy A15".to_owned(),
        url: "https://www.daraz.pk/products/galaxy-a15-i123.html".to_owned(),
        brand: "Samsung".to_owned(),
        category: Category::Phone,
        image: "https://img.lazcdn.com/g/p/abc.jpg".to_owned(),
        description: "Samsung Galaxy A15".to_owned(),
        source: "Daraz".to_owned(),
        website: "Daraz".to_owned(),
        price: 4_599_900,
    }
}

fn client(server: &MockServer) -> BackendClient {
    BackendClient::new(&format!("{}/api/scraper/price", server.uri()), 5)
        .expect("failed to build backend client")
}

#[tokio::test]
async fn submit_posts_flat_json_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/scraper/price"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "name": "Samsung Galaxy A15",
            "url": "https://www.daraz.pk/products/galaxy-a15-i123.html",
            "brand": "Samsung",
            "category": "Phone",
            "image": "https://img.lazcdn.com/g/p/abc.jpg",
            "description": "Samsung Galaxy A15",
            "source": "Daraz",
            "website": "Daraz",
            "price": 4_599_900
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).submit(&record()).await;
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn submit_treats_plain_ok_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("duplicate"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).submit(&record()).await;
    assert!(
        matches!(result, Err(RunnerError::Submission(ref msg)) if msg.contains("200") && msg.contains("duplicate")),
        "expected Submission error, got: {result:?}"
    );
}

#[tokio::test]
async fn submit_reports_server_error_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).submit(&record()).await;
    assert!(matches!(result, Err(RunnerError::Submission(_))));
}

#[tokio::test]
async fn submit_reports_transport_failure() {
    // Nothing listens on the discard port.
    let client = BackendClient::new("http://127.0.0.1:9/api/scraper/price", 2)
        .expect("failed to build backend client");

    let result = client.submit(&record()).await;
    assert!(
        matches!(result, Err(RunnerError::Http(_))),
        "expected Http error, got: {result:?}"
    );
}
