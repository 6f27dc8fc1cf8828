use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::api::client::{ApiError, ScrapeClient};
use crate::api::models::{TaskId, TaskResultResponse, TaskStatus};
use crate::config::FlowDelays;
use crate::shell::context::AppContext;
use crate::shell::navigation::NavigationManager;
use crate::shell::page::Page;

/// Where finalized task results come from. Production asks the backend;
/// tests script responses.
#[async_trait]
pub trait TaskResultSource: Send + Sync {
    async fn task_result(&self, task: &TaskId) -> Result<TaskResultResponse, ApiError>;
}

#[async_trait]
impl TaskResultSource for ScrapeClient {
    async fn task_result(&self, task: &TaskId) -> Result<TaskResultResponse, ApiError> {
        ScrapeClient::task_result(self, task).await
    }
}

/// One-shot retrieval of a completed task's record set.
///
/// The fetch is guarded by `result_fetch_attempted` so a completion frame
/// arriving more than once cannot double-fetch, and by the navigation
/// epoch so a result that lands after the user navigated away is dropped
/// instead of applied.
pub struct TaskResultFetcher {
    source: Box<dyn TaskResultSource>,
    delays: FlowDelays,
}

impl TaskResultFetcher {
    pub fn new(source: Box<dyn TaskResultSource>, delays: FlowDelays) -> Self {
        Self { source, delays }
    }

    pub async fn fetch_final_results(&self, ctx: &mut AppContext, nav: &mut NavigationManager) {
        let Some(task) = ctx.session.current_task.clone() else {
            error!("no task ID available for fetching results");
            ctx.error("Error: Could not retrieve results (no task ID).");
            return;
        };

        if ctx.session.result_fetch_attempted {
            debug!("results fetch already attempted for task {task}, skipping");
            return;
        }
        ctx.session.result_fetch_attempted = true;

        let epoch = ctx.session.nav_epoch;
        info!("fetching final results for task {task}");
        let outcome = self.source.task_result(&task).await;

        if ctx.session.nav_epoch != epoch {
            info!("navigation changed during results fetch, dropping outcome");
            ctx.session.result_fetch_attempted = false;
            return;
        }

        match outcome {
            Ok(response) if response.status == TaskStatus::Completed => {
                let records = response.data.unwrap_or_default();
                if records.is_empty() {
                    warn!("task {task} completed with no records");
                    ctx.warning("Scraping completed, but no leads were found.");
                    ctx.session.result_fetch_attempted = false;
                    tokio::time::sleep(self.delays.redirect).await;
                    nav.navigate_to_page(ctx, Page::Configure.name(), false).await;
                    return;
                }

                let total = response.total_count.unwrap_or(records.len() as u64);
                ctx.session.task_status = TaskStatus::Completed;
                ctx.session.result_set = records;
                ctx.success(&format!("Scraping completed! Found {total} leads."));
                nav.navigate_to_page(ctx, Page::Results.name(), false).await;
            }
            Ok(response) => {
                // Completion frame said done but the task record disagrees.
                let status = response.status;
                error!("task {task} not completed at fetch time (status: {status})");
                ctx.session.result_fetch_attempted = false;
                ctx.error(&format!(
                    "Failed to retrieve final results: task status is {status}"
                ));
                tokio::time::sleep(self.delays.redirect).await;
                nav.navigate_to_page(ctx, Page::Configure.name(), false).await;
            }
            Err(err) if is_task_gone(&err) => {
                error!("task {task} no longer exists: {err}");
                ctx.session.clear_task();
                ctx.error("Error: The scraping task was not found. It may have expired.");
                tokio::time::sleep(self.delays.redirect).await;
                nav.navigate_to_page(ctx, Page::Configure.name(), false).await;
            }
            Err(err) => {
                error!("results fetch failed for task {task}: {err}");
                ctx.session.result_fetch_attempted = false;
                ctx.error(&format!("Failed to retrieve final results: {err}"));
                tokio::time::sleep(self.delays.redirect).await;
                nav.navigate_to_page(ctx, Page::Configure.name(), false).await;
            }
        }
    }
}

/// The backend reports an expired or unknown task either as a plain 404 or
/// with a "Task not found" detail.
fn is_task_gone(err: &ApiError) -> bool {
    match err {
        ApiError::Status { status: 404, .. } => true,
        ApiError::Status { detail, .. } => detail.contains("Task not found"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_gone_detection() {
        assert!(is_task_gone(&ApiError::Status {
            status: 404,
            detail: "Not Found".to_string(),
        }));
        assert!(is_task_gone(&ApiError::Status {
            status: 500,
            detail: "Task not found or expired".to_string(),
        }));
        assert!(!is_task_gone(&ApiError::Status {
            status: 500,
            detail: "boom".to_string(),
        }));
        assert!(!is_task_gone(&ApiError::Network("timeout".to_string())));
    }
}
