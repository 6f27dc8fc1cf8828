pub mod context;
pub mod navigation;
pub mod page;
pub mod partial;
pub mod results_view;

pub use context::{
    Action, AiAssistHook, AppContext, Bindings, ConsoleNotifier, Containers, LogNotifier,
    MemoryNotifier, NoticeLevel, NoticeLog, Notifier, ScrapeInput, SessionState,
};
pub use navigation::NavigationManager;
pub use page::{Page, PageRegistry, PageSetup};
pub use partial::{HttpPageSource, LoadError, PageSource, PartialLoader};
pub use results_view::{ResultView, ResultsView};
