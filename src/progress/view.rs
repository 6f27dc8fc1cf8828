use crate::api::models::{ProgressEvent, TaskStatus};

/// Connection indicator shown next to the progress view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionIndicator {
    #[default]
    Disconnected,
    Connected,
    Error,
}

impl std::fmt::Display for ConnectionIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionIndicator::Connected => "connected",
            ConnectionIndicator::Disconnected => "disconnected",
            ConnectionIndicator::Error => "error",
        };
        f.write_str(label)
    }
}

const URL_DISPLAY_MAX: usize = 80;

/// Display state for a running job, updated from progress events. All
/// counters are advisory: a partial event leaves the placeholders in
/// place and never fails.
#[derive(Debug, Clone)]
pub struct ProgressViewModel {
    pub percentage: u8,
    pub message: String,
    pub status: TaskStatus,
    pub connection: ConnectionIndicator,
    pub urls_processed: u64,
    pub total_urls: u64,
    pub leads_scraped: u64,
    pub current_url: String,
    pub estimated_time: String,
    /// Leads per minute, derived from scraped count and elapsed time when
    /// possible, otherwise taken from the event.
    pub processing_rate: u64,
    pub error_count: u64,
    pub elapsed_secs: u64,
    pub last_update: Option<String>,
}

impl Default for ProgressViewModel {
    fn default() -> Self {
        Self {
            percentage: 0,
            message: "Processing...".to_string(),
            status: TaskStatus::Pending,
            connection: ConnectionIndicator::Disconnected,
            urls_processed: 0,
            total_urls: 1,
            leads_scraped: 0,
            current_url: String::new(),
            estimated_time: "--:--".to_string(),
            processing_rate: 0,
            error_count: 0,
            elapsed_secs: 0,
            last_update: None,
        }
    }
}

impl ProgressViewModel {
    /// Reset to placeholders for a fresh task.
    pub fn reset(&mut self) {
        *self = ProgressViewModel::default();
    }

    pub fn set_connection(&mut self, indicator: ConnectionIndicator) {
        self.connection = indicator;
    }

    /// Fold one progress event into the view. Missing fields keep their
    /// defaults; nothing here can fail.
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.percentage = event.percentage.unwrap_or(0.0).clamp(0.0, 100.0) as u8;
        self.message = event
            .message
            .clone()
            .unwrap_or_else(|| "Processing...".to_string());
        self.status = event.status.unwrap_or(TaskStatus::Running);

        self.urls_processed = event.urls_processed.unwrap_or(0);
        self.total_urls = event.total_urls.unwrap_or(1);
        self.leads_scraped = event.scraped_count.unwrap_or(0);
        self.error_count = event.error_count.unwrap_or(0);
        self.elapsed_secs = event.elapsed_time.unwrap_or(0.0).max(0.0) as u64;

        self.current_url = match &event.current_url {
            Some(url) if !url.is_empty() => truncate_url(url),
            _ => "Processing...".to_string(),
        };

        self.estimated_time = event
            .estimated_time
            .clone()
            .unwrap_or_else(|| "--:--".to_string());

        // Prefer a rate derived from the counters; the event's own rate is
        // the fallback.
        self.processing_rate = if self.leads_scraped > 0 && self.elapsed_secs > 0 {
            (self.leads_scraped as f64 / (self.elapsed_secs as f64 / 60.0)).round() as u64
        } else {
            event.processing_rate.unwrap_or(0.0).max(0.0).round() as u64
        };

        self.last_update = event.timestamp.clone();
    }

    /// Elapsed time as `MM:SS`.
    pub fn elapsed_display(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}

fn truncate_url(url: &str) -> String {
    if url.chars().count() > URL_DISPLAY_MAX {
        let head: String = url.chars().take(URL_DISPLAY_MAX - 3).collect();
        format!("{head}...")
    } else {
        url.to_string()
    }
}
