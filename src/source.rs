// Metrics source: fetches a port-statistics snapshot from the controller

use crate::config::SourceConfig;
use crate::models::StatisticsSnapshot;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("statistics request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("statistics endpoint returned {0}")]
    Status(StatusCode),
    #[error("invalid statistics body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can produce a point-in-time snapshot for the poll loop.
pub trait MetricsSource {
    fn fetch(&self) -> impl Future<Output = Result<StatisticsSnapshot, SourceError>> + Send;
}

/// Controller REST endpoint with optional basic auth.
pub struct HttpSource {
    client: Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MetricsSource for HttpSource {
    #[instrument(skip(self), fields(source = "http", operation = "fetch"))]
    async fn fetch(&self) -> Result<StatisticsSnapshot, SourceError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
