use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{ports::PageFetcher, DomainError};
use crate::infrastructure::config::FetchConfig;

/// Fetches job postings over HTTP(S).
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, DomainError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| DomainError::validation(format!("Invalid job URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::validation(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::timeout(format!("Fetching {url}: {e}"))
            } else {
                DomainError::external(format!("Fetching {url}: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(DomainError::validation(format!(
                "Job page {url} returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(DomainError::external(format!(
                "Job page {url} returned {status}"
            )));
        }

        let limit = self.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large(url, limit));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| read_error(url, e))? {
            if body.len() + chunk.len() > limit {
                return Err(too_large(url, limit));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "fetched page");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn too_large(url: &str, limit: usize) -> DomainError {
    DomainError::validation(format!("Job page {url} is larger than {limit} bytes"))
}

fn read_error(url: &str, e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::timeout(format!("Reading {url}: {e}"))
    } else {
        DomainError::external(format!("Reading {url}: {e}"))
    }
}
