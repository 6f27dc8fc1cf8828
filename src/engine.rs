//! Top-level wiring: owns the context and the flow components, dispatches
//! bound actions, and drives the start-job / watch-progress / fetch-results
//! sequence.

use log::{error, info, warn};

use crate::api::client::ScrapeClient;
use crate::api::models::ScrapeRequest;
use crate::api::sse::HttpProgressTransport;
use crate::config::Config;
use crate::progress::results::TaskResultFetcher;
use crate::progress::stream::{ProgressStreamClient, StreamOutcome};
use crate::shell::context::{Action, AppContext, Notifier, ScrapeInput};
use crate::shell::navigation::NavigationManager;
use crate::shell::page::{DEFAULT_FIELDS, KNOWN_FIELDS, Page, PageRegistry};
use crate::shell::partial::{HttpPageSource, PartialLoader};

/// Why a job-start request was rejected before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingToken,
    NoValidUrls,
    LeadCountOutOfRange { min: u32, max: u32 },
}

/// Validate and normalize job input: URLs must carry an http(s) scheme,
/// the lead count must sit within the configured bounds, and an empty
/// field selection falls back to the defaults.
pub fn validate_input(input: &ScrapeInput, config: &Config) -> Result<ScrapeRequest, ValidationIssue> {
    let Some(token) = config.auth_token.clone().filter(|t| !t.is_empty()) else {
        return Err(ValidationIssue::MissingToken);
    };

    let urls: Vec<String> = input
        .urls
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .collect();
    if urls.is_empty() {
        return Err(ValidationIssue::NoValidUrls);
    }

    let bounds = &config.bounds;
    if input.lead_count < bounds.min || input.lead_count > bounds.max {
        return Err(ValidationIssue::LeadCountOutOfRange {
            min: bounds.min,
            max: bounds.max,
        });
    }

    let fields = if input.fields.is_empty() {
        DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
    } else {
        input.fields.clone()
    };

    Ok(ScrapeRequest {
        urls,
        lead_count: input.lead_count,
        fields,
        auth_token: token,
    })
}

/// The client engine. Single-flight: callers await one operation before
/// issuing the next, which is what makes the session state's check-and-set
/// guards sound.
pub struct Engine {
    pub config: Config,
    pub client: ScrapeClient,
    pub ctx: AppContext,
    pub nav: NavigationManager,
    pub stream: ProgressStreamClient,
    pub fetcher: TaskResultFetcher,
}

impl Engine {
    /// Engine wired against the backend named by `config.base_url`.
    pub fn new(config: Config, notifier: Box<dyn Notifier>) -> Self {
        let client = ScrapeClient::new(config.base_url.clone());
        let loader = PartialLoader::new(Box::new(HttpPageSource::new(client.clone())));
        let nav = NavigationManager::new(loader, PageRegistry::with_defaults());
        let transport = HttpProgressTransport::new(client.http(), config.base_url.clone());
        let stream = ProgressStreamClient::new(Box::new(transport), config.reconnect.clone());
        let fetcher = TaskResultFetcher::new(Box::new(client.clone()), config.delays.clone());

        Self {
            config,
            client,
            ctx: AppContext::new(notifier),
            nav,
            stream,
            fetcher,
        }
    }

    /// Engine with every seam injected; used by tests.
    pub fn from_parts(
        config: Config,
        ctx: AppContext,
        nav: NavigationManager,
        stream: ProgressStreamClient,
        fetcher: TaskResultFetcher,
    ) -> Self {
        let client = ScrapeClient::new(config.base_url.clone());
        Self {
            config,
            client,
            ctx,
            nav,
            stream,
            fetcher,
        }
    }

    /// Initial load: show the home page.
    pub async fn init(&mut self) {
        info!("session {} starting", self.ctx.session.session_id);
        self.nav
            .navigate_to_page(&mut self.ctx, Page::Home.name(), true)
            .await;
    }

    pub async fn navigate(&mut self, name: &str) {
        self.nav.navigate_to_page(&mut self.ctx, name, false).await;
    }

    /// Validate the input, show the progress page, and ask the backend to
    /// start a job. Returns whether a task is now running.
    pub async fn start_scraping(&mut self, input: ScrapeInput) -> bool {
        self.ctx.session.result_fetch_attempted = false;
        self.ctx.session.result_set.clear();

        let request = match validate_input(&input, &self.config) {
            Ok(request) => request,
            Err(issue) => {
                self.report_validation(issue).await;
                return false;
            }
        };

        self.navigate(Page::Progress.name()).await;

        match self.client.start_scrape(&request).await {
            Ok(task) => {
                info!("scrape task created: {task}");
                self.ctx.success("Scraping started successfully!");
                self.ctx.session.begin_task(task.clone());
                self.stream.open(task);
                true
            }
            Err(err) => {
                error!("failed to start scraping: {err}");
                self.ctx.error(&format!("Failed to start scraping: {err}"));
                self.navigate(Page::Configure.name()).await;
                false
            }
        }
    }

    async fn report_validation(&mut self, issue: ValidationIssue) {
        match issue {
            ValidationIssue::MissingToken => {
                self.ctx
                    .error("Please configure your scraper API token in Settings first.");
                self.navigate(Page::Settings.name()).await;
            }
            ValidationIssue::NoValidUrls => {
                self.ctx.error(
                    "Please enter at least one valid URL (must start with http:// or https://).",
                );
            }
            ValidationIssue::LeadCountOutOfRange { min, max } => {
                self.ctx
                    .error(&format!("Lead count must be between {min} and {max}."));
            }
        }
    }

    /// Watch the opened stream to its end and run the follow-up: fetch
    /// final results on completion, or redirect back to configuration on
    /// failure. No-op when the stream gave up or was closed.
    pub async fn run_progress(&mut self) {
        match self.stream.run(&mut self.ctx).await {
            StreamOutcome::Completed => {
                tokio::time::sleep(self.config.delays.result_settle).await;
                self.fetcher
                    .fetch_final_results(&mut self.ctx, &mut self.nav)
                    .await;
            }
            StreamOutcome::Failed { .. } => {
                tokio::time::sleep(self.config.delays.redirect).await;
                self.navigate(Page::Configure.name()).await;
            }
            StreamOutcome::Unavailable | StreamOutcome::Closed => {}
        }
    }

    /// Fire the action bound to an interactive element, if any.
    pub async fn activate(&mut self, element_id: &str) {
        let Some(action) = self.ctx.bindings.action(element_id).cloned() else {
            warn!("no action bound to element '{element_id}'");
            return;
        };

        match action {
            Action::Navigate(page) => self.navigate(page.name()).await,
            Action::StartScraping => {
                let input = self.ctx.draft.clone();
                self.start_scraping(input).await;
            }
            Action::SaveSettings => {
                // Token storage lives with the embedder (env for the CLI).
                self.ctx.success("Settings saved successfully!");
            }
            Action::ExportCsv => self.export("csv"),
            Action::ExportJson => self.export("json"),
            Action::ToggleResultView => self.ctx.results_view.toggle(),
            Action::SelectAllFields => {
                self.ctx.draft.fields = KNOWN_FIELDS.iter().map(|f| f.to_string()).collect();
            }
            Action::ClearAllFields => self.ctx.draft.fields.clear(),
        }
    }

    /// Hand the user the export URL for the finished task. The download
    /// itself happens outside the engine.
    fn export(&mut self, format: &str) {
        let task = self.ctx.session.current_task.clone();
        match task {
            Some(task) if !self.ctx.session.result_set.is_empty() => {
                let url = self.client.export_url(format, &task);
                self.ctx.info(&format!("Export ready: {url}"));
            }
            _ => self.ctx.warning("No results available to export."),
        }
    }
}
