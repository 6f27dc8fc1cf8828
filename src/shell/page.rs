use std::collections::HashMap;

use log::{debug, warn};

use crate::shell::context::{Action, AppContext};

/// The navigable pages. A typed enum instead of a name-keyed table: an
/// unknown name is rejected at the navigation boundary and everything past
/// it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Configure,
    Progress,
    Settings,
    Results,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::Configure,
        Page::Progress,
        Page::Settings,
        Page::Results,
    ];

    /// Stable logical name used in navigation requests and the nav UI.
    pub fn name(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Configure => "configure",
            Page::Progress => "progress",
            Page::Settings => "settings",
            Page::Results => "results",
        }
    }

    /// Id of the placeholder container that receives this page's partial.
    pub fn container_id(self) -> &'static str {
        match self {
            Page::Home => "homePage",
            Page::Configure => "configurationSection",
            Page::Progress => "progressSection",
            Page::Settings => "settingsPage",
            Page::Results => "resultsSection",
        }
    }

    pub fn from_name(name: &str) -> Option<Page> {
        Page::ALL.iter().copied().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One-time wiring of a page's interactive elements, run after its partial
/// has been injected. Runs once per navigation; implementations must stay
/// idempotent (bindings replace, never stack).
pub trait PageSetup: Send {
    fn setup(&self, ctx: &mut AppContext);
}

/// Maps each page kind to its setup routine. A page without a registered
/// setup is a logged no-op, not an error.
pub struct PageRegistry {
    map: HashMap<Page, Box<dyn PageSetup>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Registry with the standard initializer for every page.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Page::Home, Box::new(HomeSetup));
        registry.register(Page::Configure, Box::new(ConfigureSetup));
        registry.register(Page::Progress, Box::new(ProgressSetup));
        registry.register(Page::Settings, Box::new(SettingsSetup));
        registry.register(Page::Results, Box::new(ResultsSetup));
        registry
    }

    pub fn register(&mut self, page: Page, setup: Box<dyn PageSetup>) {
        self.map.insert(page, setup);
    }

    pub fn get(&self, page: Page) -> Option<&dyn PageSetup> {
        self.map.get(&page).map(|s| s.as_ref())
    }

    /// Run the page's initializer if one is registered.
    pub fn run(&self, page: Page, ctx: &mut AppContext) {
        match self.get(page) {
            Some(setup) => {
                debug!("running initializer for page '{page}'");
                setup.setup(ctx);
            }
            None => warn!("no initializer registered for page '{page}'"),
        }
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Lead-record fields the configuration page can toggle on.
pub const KNOWN_FIELDS: [&str; 9] = [
    "name",
    "email",
    "company",
    "title",
    "phone",
    "linkedin",
    "website",
    "location",
    "industry",
];

/// Fields requested when the user selects none.
pub const DEFAULT_FIELDS: [&str; 4] = ["name", "email", "company", "title"];

struct HomeSetup;

impl PageSetup for HomeSetup {
    fn setup(&self, ctx: &mut AppContext) {
        ctx.bindings
            .bind("startAutomationBtn", Action::Navigate(Page::Settings));
    }
}

struct ConfigureSetup;

impl PageSetup for ConfigureSetup {
    fn setup(&self, ctx: &mut AppContext) {
        ctx.bindings.bind("startScraping", Action::StartScraping);
        ctx.bindings.bind("selectAllFields", Action::SelectAllFields);
        ctx.bindings.bind("clearAllFields", Action::ClearAllFields);
        if ctx.draft.fields.is_empty() {
            ctx.draft.fields = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();
        }
    }
}

struct ProgressSetup;

impl PageSetup for ProgressSetup {
    fn setup(&self, ctx: &mut AppContext) {
        // Fresh view model for the incoming stream.
        ctx.progress.reset();
    }
}

struct SettingsSetup;

impl PageSetup for SettingsSetup {
    fn setup(&self, ctx: &mut AppContext) {
        ctx.bindings.bind("saveSettings", Action::SaveSettings);
    }
}

struct ResultsSetup;

impl PageSetup for ResultsSetup {
    fn setup(&self, ctx: &mut AppContext) {
        ctx.bindings.bind("exportCsv", Action::ExportCsv);
        ctx.bindings.bind("exportJson", Action::ExportJson);
        ctx.bindings.bind("viewToggle", Action::ToggleResultView);
    }
}
