use crate::domain::errors::DomainError;
use async_trait::async_trait;

/// Fetches the raw body of a web page, e.g. a job posting.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, DomainError>;
}
