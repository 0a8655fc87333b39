//! Delivery of accepted records to the ingestion backend.

use std::time::Duration;

use async_trait::async_trait;
use pricefeed_core::{AppConfig, ProductRecord};
use reqwest::{Client, StatusCode};

use crate::error::RunnerError;

/// Accepts one record at a time.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// # Errors
    ///
    /// Any outcome other than the backend confirming creation.
    async fn submit(&self, record: &ProductRecord) -> Result<(), RunnerError>;
}

/// `POST`s each record as JSON to a fixed endpoint.
///
/// Only `201 Created` counts as delivered.
pub struct BackendClient {
    client: Client,
    endpoint: String,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, RunnerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pricefeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`BackendClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, RunnerError> {
        Self::new(&config.backend_url, config.submit_timeout_secs)
    }
}

#[async_trait]
impl Submitter for BackendClient {
    async fn submit(&self, record: &ProductRecord) -> Result<(), RunnerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(RunnerError::Submission(format!(
            "backend answered {status} for \"{}\": {snippet}",
            record.name
        )))
    }
}
