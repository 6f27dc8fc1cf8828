use std::fs::File;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use env_logger::Target;
use log::info;
use serde_json::Value;

use leadscout::api::client::ScrapeClient;
use leadscout::api::models::{TaskId, TaskStatus};
use leadscout::cli::{Cli, Command};
use leadscout::config::Config;
use leadscout::engine::Engine;
use leadscout::shell::context::{ConsoleNotifier, ScrapeInput};
use leadscout::shell::results_view::ResultsView;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Command::Run { urls, count, fields } => run_job(config, urls, count, fields).await,
        Command::Status { task_id } => show_status(config, task_id).await,
    }
}

/// Log to a file so the terminal stays reserved for job output.
fn setup_logging() -> Result<()> {
    let log_file = File::create("leadscout.log").context("Failed to create log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

async fn run_job(config: Config, urls: Vec<String>, count: u32, fields: Vec<String>) -> Result<()> {
    let mut engine = Engine::new(config, Box::new(ConsoleNotifier));
    engine.init().await;

    let input = ScrapeInput {
        urls,
        lead_count: count,
        fields,
    };
    if !engine.start_scraping(input).await {
        bail!("scraping job was not started");
    }

    let task = engine
        .ctx
        .session
        .current_task
        .clone()
        .map(|t| t.to_string())
        .unwrap_or_default();
    info!("following progress for task {task}");
    println!("task {}", task.bold());

    engine.run_progress().await;
    print_results(&engine);

    if engine.ctx.session.task_status == TaskStatus::Failed {
        bail!("scraping job failed");
    }
    Ok(())
}

async fn show_status(config: Config, task_id: String) -> Result<()> {
    let client = ScrapeClient::new(config.base_url.clone());
    let task = TaskId(task_id);
    let result = client.task_result(&task).await?;

    println!("status: {}", result.status.to_string().bold());
    if let Some(percentage) = result.percentage {
        println!("progress: {percentage:.0}%");
    }
    if let Some(message) = result.message {
        println!("message: {message}");
    }
    if result.status == TaskStatus::Completed {
        let count = result
            .total_count
            .or_else(|| result.data.as_ref().map(|d| d.len() as u64))
            .unwrap_or(0);
        println!("{}", ResultsView::count_label(count));
        println!("csv:  {}", client.export_url("csv", &task));
        println!("json: {}", client.export_url("json", &task));
    }
    Ok(())
}

fn print_results(engine: &Engine) {
    let records = &engine.ctx.session.result_set;
    if records.is_empty() {
        return;
    }

    println!("\n{}", ResultsView::count_label(records.len() as u64).bold());
    let headers = ResultsView::headers(records);
    println!("{}", headers.join(" | ").dimmed());

    for record in engine.ctx.results_view.preview(records) {
        let row: Vec<String> = headers.iter().map(|h| cell(record, h)).collect();
        println!("{}", row.join(" | "));
    }
    if records.len() > engine.ctx.results_view.preview(records).len() {
        println!("{}", "(preview truncated; use export for the full set)".dimmed());
    }
}

fn cell(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}
