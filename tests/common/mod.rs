//! Shared doubles for the integration tests: static page partials, a
//! scripted progress transport, and a scripted result source.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use serde_json::Value;

use leadscout::api::client::ApiError;
use leadscout::api::models::{ProgressEvent, TaskId, TaskResultResponse};
use leadscout::api::sse::{EventStream, ProgressTransport, TransportError};
use leadscout::progress::results::TaskResultSource;
use leadscout::shell::context::{AppContext, MemoryNotifier, NoticeLog};
use leadscout::shell::navigation::NavigationManager;
use leadscout::shell::page::{Page, PageRegistry};
use leadscout::shell::partial::{LoadError, PageSource, PartialLoader};

/// Context backed by a recording notifier; the log handle observes every
/// notice emitted during the test.
pub fn test_ctx() -> (AppContext, NoticeLog) {
    let notifier = MemoryNotifier::new();
    let log = notifier.log();
    (AppContext::new(Box::new(notifier)), log)
}

pub fn event(json: Value) -> ProgressEvent {
    serde_json::from_value(json).expect("valid progress event json")
}

pub fn result_response(json: Value) -> TaskResultResponse {
    serde_json::from_value(json).expect("valid task result json")
}

/// Page source serving canned markup per container, with optional forced
/// failures.
pub struct StaticPageSource {
    pages: HashMap<String, String>,
    failing: Vec<String>,
}

impl StaticPageSource {
    /// Markup for every known page.
    pub fn serving_all() -> Self {
        let pages = Page::ALL
            .iter()
            .map(|page| {
                let id = page.container_id();
                (id.to_string(), format!("<div data-page=\"{id}\"></div>"))
            })
            .collect();
        Self {
            pages,
            failing: Vec::new(),
        }
    }

    /// Make requests for `container_id` fail with a server error.
    pub fn failing_for(mut self, container_id: &str) -> Self {
        self.failing.push(container_id.to_string());
        self
    }
}

#[async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(&self, container_id: &str) -> Result<String, LoadError> {
        if self.failing.iter().any(|id| id == container_id) {
            return Err(LoadError::HttpStatus(500));
        }
        self.pages
            .get(container_id)
            .cloned()
            .ok_or(LoadError::HttpStatus(404))
    }
}

/// Navigation manager over static partials and the default page registry.
pub fn nav_with(source: StaticPageSource) -> NavigationManager {
    NavigationManager::new(
        PartialLoader::new(Box::new(source)),
        PageRegistry::with_defaults(),
    )
}

pub type ConnectOutcome = Result<Vec<Result<ProgressEvent, TransportError>>, TransportError>;

/// Transport whose connect attempts play back a script: each entry either
/// fails the connection or yields a fixed event sequence (after which the
/// stream ends, as a dropped connection would).
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ConnectOutcome>>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ConnectOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of connection attempts, readable after the transport is
    /// boxed away.
    pub fn connect_counter(&self) -> Arc<AtomicUsize> {
        self.connects.clone()
    }
}

#[async_trait]
impl ProgressTransport for ScriptedTransport {
    async fn connect(&self, _task: &TaskId) -> Result<EventStream, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().expect("script poisoned").pop_front() {
            Some(Ok(events)) => Ok(Box::pin(stream::iter(events))),
            Some(Err(err)) => Err(err),
            None => Err(TransportError::Connect(
                "no more scripted connections".to_string(),
            )),
        }
    }
}

/// Result source playing back scripted responses, counting calls.
pub struct ScriptedResults {
    responses: Mutex<VecDeque<Result<TaskResultResponse, ApiError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResults {
    pub fn new(responses: Vec<Result<TaskResultResponse, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TaskResultSource for ScriptedResults {
    async fn task_result(&self, _task: &TaskId) -> Result<TaskResultResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .expect("responses poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}
