use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use serde_json::Value;

use super::models::{ScrapeRequest, StartScrapeResponse, TaskId, TaskResultResponse};

/// Errors from backend HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// HTTP client for the scraping backend, with connection pooling.
#[derive(Clone)]
pub struct ScrapeClient {
    base_url: String,
    http: reqwest::Client,
}

impl ScrapeClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("leadscout/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self { base_url, http }
    }

    /// Shared HTTP client for making requests (cheap clone).
    pub fn http(&self) -> reqwest::Client {
        self.http.clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a scraping job. Returns the task id assigned by the backend.
    pub async fn start_scrape(&self, request: &ScrapeRequest) -> Result<TaskId, ApiError> {
        let url = format!("{}/scrape", self.base_url);
        debug!("POST {url}");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), response).await);
        }

        let body: StartScrapeResponse = response.json().await?;
        match body.task_id {
            Some(task_id) => Ok(TaskId(task_id)),
            None => Err(ApiError::Protocol(
                body.detail
                    .or(body.message)
                    .unwrap_or_else(|| "No task ID returned from server".to_string()),
            )),
        }
    }

    /// Current status and (once completed) the finalized record set.
    pub async fn task_result(&self, task: &TaskId) -> Result<TaskResultResponse, ApiError> {
        let url = format!("{}/scrape/{}", self.base_url, task);
        debug!("GET {url}");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), response).await);
        }
        Ok(response.json().await?)
    }

    /// Fetch the HTML partial for a page container. The query parameter
    /// defeats intermediary caching so navigation always sees fresh markup.
    pub async fn fetch_partial(&self, container_id: &str) -> Result<String, ApiError> {
        let url = format!(
            "{}/pages/{}.html?v={}",
            self.base_url,
            container_id,
            epoch_millis()
        );
        debug!("GET {url}");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Download URL for a finished task's export, handed to the user rather
    /// than fetched by the engine.
    pub fn export_url(&self, format: &str, task: &TaskId) -> String {
        format!("{}/export/{}/{}", self.base_url, format, task)
    }
}

/// Extract the error `detail` from a failed response body, falling back to
/// the HTTP reason phrase.
async fn status_error(status: u16, response: reqwest::Response) -> ApiError {
    let detail = match response.json::<Value>().await {
        Ok(body) => body
            .get("detail")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Err(_) => None,
    };
    ApiError::Status {
        status,
        detail: detail.unwrap_or_else(|| format!("Server error ({status})")),
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_shape() {
        let client = ScrapeClient::new("http://localhost:8000".to_string());
        let task = TaskId::from("abc123");

        assert_eq!(
            client.export_url("csv", &task),
            "http://localhost:8000/export/csv/abc123"
        );
    }
}
