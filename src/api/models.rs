use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque task identifier assigned by the backend when a job is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle of one backend scraping job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Body for `POST /scrape`.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
    pub lead_count: u32,
    pub fields: Vec<String>,
    pub auth_token: String,
}

/// Response from `POST /scrape`. `task_id` is absent on backend-side
/// rejection, in which case `detail`/`message` explain why.
#[derive(Debug, Clone, Deserialize)]
pub struct StartScrapeResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET /scrape/{taskId}`: current status and, once the job
/// has completed, the finalized record set.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResultResponse {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// One event on the progress stream. Every field is optional: the backend
/// emits connection markers, error payloads, progress updates and terminal
/// frames over the same channel, and partial frames are valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressEvent {
    pub percentage: Option<f64>,
    pub message: Option<String>,
    pub status: Option<TaskStatus>,
    /// Connection-established marker ("established" on the first frame).
    pub connection: Option<String>,
    /// Explicit backend-reported error; does not end the stream by itself.
    pub error: Option<String>,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub urls_processed: Option<u64>,
    pub total_urls: Option<u64>,
    pub scraped_count: Option<u64>,
    pub current_url: Option<String>,
    pub estimated_time: Option<String>,
    pub processing_rate: Option<f64>,
    pub error_count: Option<u64>,
    pub elapsed_time: Option<f64>,
    pub timestamp: Option<String>,
}

impl ProgressEvent {
    /// True for the stream's connection-established marker frame.
    pub fn is_connection_established(&self) -> bool {
        self.connection.as_deref() == Some("established")
    }

    /// True when this frame ends the stream: explicit terminal status or
    /// the `final` flag.
    pub fn is_terminal(&self) -> bool {
        self.is_final
            || matches!(
                self.status,
                Some(TaskStatus::Completed) | Some(TaskStatus::Failed)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_minimal_payload() {
        let event: ProgressEvent = serde_json::from_str(r#"{"percentage": 42}"#).unwrap();

        assert_eq!(event.percentage, Some(42.0));
        assert!(event.message.is_none());
        assert!(event.status.is_none());
        assert!(!event.is_terminal());
        assert!(!event.is_connection_established());
    }

    #[test]
    fn test_progress_event_terminal_detection() {
        let completed: ProgressEvent =
            serde_json::from_str(r#"{"status": "completed", "percentage": 100}"#).unwrap();
        assert!(completed.is_terminal());
        assert_eq!(completed.status, Some(TaskStatus::Completed));

        let failed: ProgressEvent = serde_json::from_str(r#"{"status": "failed"}"#).unwrap();
        assert!(failed.is_terminal());

        let final_only: ProgressEvent = serde_json::from_str(r#"{"final": true}"#).unwrap();
        assert!(final_only.is_terminal());
        assert!(final_only.status.is_none());

        let running: ProgressEvent = serde_json::from_str(r#"{"status": "running"}"#).unwrap();
        assert!(!running.is_terminal());
    }

    #[test]
    fn test_connection_marker() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"connection": "established"}"#).unwrap();
        assert!(event.is_connection_established());
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_task_result_defaults() {
        let resp: TaskResultResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(resp.status, TaskStatus::Pending);
        assert!(resp.data.is_none());
        assert!(resp.total_count.is_none());
    }
}
