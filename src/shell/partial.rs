use async_trait::async_trait;
use log::debug;

use crate::api::client::{ApiError, ScrapeClient};

/// Failure to retrieve a page partial.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("partial request failed with status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
}

/// Where page partials come from. Production fetches them from the
/// backend; tests serve static markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, container_id: &str) -> Result<String, LoadError>;
}

/// Partials served by the backend's `/pages/{id}.html` resources.
pub struct HttpPageSource {
    client: ScrapeClient,
}

impl HttpPageSource {
    pub fn new(client: ScrapeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, container_id: &str) -> Result<String, LoadError> {
        self.client
            .fetch_partial(container_id)
            .await
            .map_err(|err| match err {
                ApiError::Status { status, .. } => LoadError::HttpStatus(status),
                other => LoadError::Network(other.to_string()),
            })
    }
}

/// Fetches the HTML fragment for a page container. Pure fetch; injecting
/// the markup (or an error placeholder) is the caller's job.
pub struct PartialLoader {
    source: Box<dyn PageSource>,
}

impl PartialLoader {
    pub fn new(source: Box<dyn PageSource>) -> Self {
        Self { source }
    }

    pub async fn load(&self, container_id: &str) -> Result<String, LoadError> {
        debug!("fetching partial for container '{container_id}'");
        self.source.fetch(container_id).await
    }
}
