//! End-to-end engine flows over scripted collaborators: action dispatch,
//! job-start validation redirects, and the post-stream hand-offs.

mod common;

use common::{
    ConnectOutcome, ScriptedResults, ScriptedTransport, StaticPageSource, event, nav_with,
    result_response, test_ctx,
};
use leadscout::api::client::ApiError;
use leadscout::api::models::{TaskId, TaskResultResponse};
use leadscout::config::Config;
use leadscout::engine::Engine;
use leadscout::progress::results::TaskResultFetcher;
use leadscout::progress::stream::ProgressStreamClient;
use leadscout::shell::context::{NoticeLevel, NoticeLog};
use serde_json::json;

fn engine_with(
    config: Config,
    stream_script: Vec<ConnectOutcome>,
    results: Vec<Result<TaskResultResponse, ApiError>>,
) -> (Engine, NoticeLog) {
    let (ctx, log) = test_ctx();
    let nav = nav_with(StaticPageSource::serving_all());
    let stream = ProgressStreamClient::new(
        Box::new(ScriptedTransport::new(stream_script)),
        config.reconnect.clone(),
    );
    let fetcher = TaskResultFetcher::new(
        Box::new(ScriptedResults::new(results)),
        config.delays.clone(),
    );
    (Engine::from_parts(config, ctx, nav, stream, fetcher), log)
}

#[tokio::test]
async fn test_activate_dispatches_bound_navigation() {
    let (mut engine, _log) = engine_with(Config::immediate(), vec![], vec![]);
    engine.init().await;

    engine.activate("startAutomationBtn").await;

    assert_eq!(engine.ctx.containers.visible_ids(), vec!["settingsPage"]);
}

#[tokio::test]
async fn test_field_selection_actions() {
    let (mut engine, _log) = engine_with(Config::immediate(), vec![], vec![]);
    engine.navigate("configure").await;
    assert_eq!(engine.ctx.draft.fields.len(), 4);

    engine.activate("selectAllFields").await;
    assert_eq!(engine.ctx.draft.fields.len(), 9);

    engine.activate("clearAllFields").await;
    assert!(engine.ctx.draft.fields.is_empty());
}

/// Starting without a configured token is rejected before any request and
/// routes the user to settings.
#[tokio::test]
async fn test_start_without_token_redirects_to_settings() {
    let (mut engine, log) = engine_with(Config::immediate(), vec![], vec![]);
    engine.navigate("configure").await;
    engine.ctx.draft.urls = vec!["https://example.com".to_string()];
    engine.ctx.draft.lead_count = 1000;

    engine.activate("startScraping").await;

    assert_eq!(engine.ctx.containers.visible_ids(), vec!["settingsPage"]);
    assert!(log.contains(
        NoticeLevel::Error,
        "Please configure your scraper API token in Settings first."
    ));
}

/// Completion hand-off: stream finishes, results are fetched once, and the
/// user lands on the results page.
#[tokio::test]
async fn test_run_progress_completion_lands_on_results() {
    let (mut engine, log) = engine_with(
        Config::immediate(),
        vec![Ok(vec![
            Ok(event(json!({"connection": "established"}))),
            Ok(event(json!({"percentage": 100, "status": "completed", "final": true}))),
        ])],
        vec![Ok(result_response(json!({
            "status": "completed",
            "data": [{"name": "Ada"}]
        })))],
    );
    engine.ctx.session.begin_task(TaskId::from("t1"));
    engine.stream.open(TaskId::from("t1"));

    engine.run_progress().await;

    assert_eq!(engine.ctx.containers.visible_ids(), vec!["resultsSection"]);
    assert_eq!(engine.ctx.session.result_set.len(), 1);
    assert!(log.contains(NoticeLevel::Success, "Scraping completed! Found 1 leads."));
}

/// Failure hand-off: a failed terminal frame redirects back to the
/// configuration page without touching the results fetcher.
#[tokio::test]
async fn test_run_progress_failure_returns_to_configure() {
    let (mut engine, log) = engine_with(
        Config::immediate(),
        vec![Ok(vec![
            Ok(event(json!({"connection": "established"}))),
            Ok(event(json!({"status": "failed", "message": "blocked"}))),
        ])],
        vec![],
    );
    engine.ctx.session.begin_task(TaskId::from("t1"));
    engine.stream.open(TaskId::from("t1"));

    engine.run_progress().await;

    assert_eq!(
        engine.ctx.containers.visible_ids(),
        vec!["configurationSection"]
    );
    assert!(log.contains(NoticeLevel::Error, "Scraping failed: blocked"));
}

#[tokio::test]
async fn test_export_without_results_warns() {
    let (mut engine, log) = engine_with(Config::immediate(), vec![], vec![]);
    engine.navigate("results").await;

    engine.activate("exportCsv").await;

    assert!(log.contains(NoticeLevel::Warning, "No results available to export."));
}
