use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use colored::Colorize;
use log::{debug, error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::api::models::{TaskId, TaskStatus};
use crate::progress::view::ProgressViewModel;
use crate::shell::page::Page;
use crate::shell::results_view::ResultsView;

/// Session-wide state owned by the application context. Everything here is
/// mutated only through the engine's components; there are no ambient
/// globals.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    /// The page currently visible; exactly one container is shown at a time.
    pub current_page: Page,
    /// Task id of the running job, if any. Cleared on terminal failure or
    /// when the backend reports the task gone.
    pub current_task: Option<TaskId>,
    pub task_status: TaskStatus,
    /// Final record set; non-empty only after a completed task's results
    /// were fetched.
    pub result_set: Vec<Value>,
    /// At-most-once guard for the final-results fetch. Check-and-set, valid
    /// because the engine is driven single-flight.
    pub result_fetch_attempted: bool,
    /// Incremented on every navigation; a results fetch that started under
    /// an older epoch discards its outcome instead of applying it.
    pub nav_epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            current_page: Page::Home,
            current_task: None,
            task_status: TaskStatus::Pending,
            result_set: Vec::new(),
            result_fetch_attempted: false,
            nav_epoch: 0,
        }
    }

    /// Adopt a freshly created task, resetting per-task state.
    pub fn begin_task(&mut self, task: TaskId) {
        info!("task started: {task}");
        self.current_task = Some(task);
        self.task_status = TaskStatus::Pending;
        self.result_set.clear();
        self.result_fetch_attempted = false;
    }

    /// Drop all task state, e.g. after the backend reports the task gone.
    pub fn clear_task(&mut self) {
        self.current_task = None;
        self.task_status = TaskStatus::Pending;
        self.result_set.clear();
        self.result_fetch_attempted = false;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// One page placeholder: injected markup plus visibility.
#[derive(Debug, Default, Clone)]
pub struct Container {
    pub content: String,
    pub visible: bool,
}

/// The set of page containers, standing in for the document tree. Seeded
/// with one entry per page kind.
#[derive(Debug)]
pub struct Containers {
    map: HashMap<&'static str, Container>,
}

impl Containers {
    pub fn new() -> Self {
        let map = Page::ALL
            .iter()
            .map(|page| (page.container_id(), Container::default()))
            .collect();
        Self { map }
    }

    pub fn get(&self, container_id: &str) -> Option<&Container> {
        self.map.get(container_id)
    }

    pub fn hide_all(&mut self) {
        for container in self.map.values_mut() {
            container.visible = false;
        }
    }

    pub fn show(&mut self, container_id: &str) {
        if let Some(container) = self.map.get_mut(container_id) {
            container.visible = true;
        }
    }

    /// Replace the container's markup with freshly loaded content.
    pub fn inject(&mut self, container_id: &str, html: String) {
        if let Some(container) = self.map.get_mut(container_id) {
            container.content = html;
        }
    }

    /// Replace the container's markup with a visible error placeholder.
    pub fn inject_error(&mut self, container_id: &str) {
        self.inject(
            container_id,
            "<p class=\"error-placeholder\">Error loading content for this page. \
             Please try again.</p>"
                .to_string(),
        );
    }

    /// Container ids currently visible. After any completed navigation this
    /// has exactly one element.
    pub fn visible_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self
            .map
            .iter()
            .filter(|(_, c)| c.visible)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for Containers {
    fn default() -> Self {
        Self::new()
    }
}

/// Interactive behaviors a page initializer can wire to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(Page),
    StartScraping,
    SaveSettings,
    ExportCsv,
    ExportJson,
    ToggleResultView,
    SelectAllFields,
    ClearAllFields,
}

/// Handle returned by [`Bindings::bind`]; disposing it removes the binding
/// if it is still the current one for its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingHandle {
    element_id: String,
    seq: u64,
}

#[derive(Debug)]
struct Binding {
    seq: u64,
    action: Action,
}

/// Element-to-action table replacing DOM event listeners. Binding an
/// element id that is already bound disposes the previous binding first,
/// so re-running a page initializer rewires idempotently.
#[derive(Debug, Default)]
pub struct Bindings {
    map: HashMap<String, Binding>,
    next_seq: u64,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, element_id: &str, action: Action) -> BindingHandle {
        if self.map.remove(element_id).is_some() {
            debug!("rebound listener for {element_id}");
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        self.map.insert(element_id.to_string(), Binding { seq, action });
        BindingHandle {
            element_id: element_id.to_string(),
            seq,
        }
    }

    /// Dispose a binding by handle. A handle superseded by a later `bind`
    /// for the same element is a no-op.
    pub fn dispose(&mut self, handle: &BindingHandle) {
        if self
            .map
            .get(&handle.element_id)
            .is_some_and(|b| b.seq == handle.seq)
        {
            self.map.remove(&handle.element_id);
        }
    }

    pub fn action(&self, element_id: &str) -> Option<&Action> {
        self.map.get(element_id).map(|b| &b.action)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Toast seam: every user-facing message flows through here.
pub trait Notifier: Send {
    fn notify(&mut self, level: NoticeLevel, message: &str);
}

/// Notifier that forwards notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success | NoticeLevel::Info => info!("{message}"),
            NoticeLevel::Warning => warn!("{message}"),
            NoticeLevel::Error => error!("{message}"),
        }
    }
}

/// Notifier printing colored notices to the terminal, used by the CLI.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success => println!("{} {message}", "ok".green().bold()),
            NoticeLevel::Info => println!("{} {message}", "--".dimmed()),
            NoticeLevel::Warning => println!("{} {message}", "warn".yellow().bold()),
            NoticeLevel::Error => eprintln!("{} {message}", "error".red().bold()),
        }
    }
}

/// Shared, inspectable record of emitted notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog(Arc<Mutex<Vec<(NoticeLevel, String)>>>);

impl NoticeLog {
    pub fn snapshot(&self) -> Vec<(NoticeLevel, String)> {
        self.0.lock().expect("notice log poisoned").clone()
    }

    pub fn contains(&self, level: NoticeLevel, needle: &str) -> bool {
        self.snapshot()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.snapshot().iter().filter(|(l, _)| *l == level).count()
    }
}

/// Recording notifier for tests; notices are observable through the
/// [`NoticeLog`] handle obtained before the notifier is boxed.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    log: NoticeLog,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> NoticeLog {
        self.log.clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.log
            .0
            .lock()
            .expect("notice log poisoned")
            .push((level, message.to_string()));
    }
}

/// Optional AI-assist subcomponent re-armed after the configuration page is
/// injected. Navigation tolerates its absence.
pub trait AiAssistHook: Send {
    /// Re-initialize against freshly injected markup. Returns whether the
    /// component armed successfully.
    fn arm(&mut self) -> bool;
}

/// Form state for the configuration page, filled by the embedder (or the
/// CLI) before the start action fires.
#[derive(Debug, Clone, Default)]
pub struct ScrapeInput {
    pub urls: Vec<String>,
    pub lead_count: u32,
    pub fields: Vec<String>,
}

/// The application context: session state, view models and collaborators,
/// threaded by mutable reference through every component.
pub struct AppContext {
    pub session: SessionState,
    pub containers: Containers,
    pub bindings: Bindings,
    pub progress: ProgressViewModel,
    pub results_view: ResultsView,
    pub draft: ScrapeInput,
    pub notifier: Box<dyn Notifier>,
    pub ai_assist: Option<Box<dyn AiAssistHook>>,
}

impl AppContext {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            session: SessionState::new(),
            containers: Containers::new(),
            bindings: Bindings::new(),
            progress: ProgressViewModel::default(),
            results_view: ResultsView::default(),
            draft: ScrapeInput::default(),
            notifier,
            ai_assist: None,
        }
    }

    pub fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notifier.notify(level, message);
    }

    pub fn success(&mut self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    pub fn info(&mut self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}
