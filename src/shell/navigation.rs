use log::{debug, error, info, warn};

use crate::shell::context::AppContext;
use crate::shell::page::{Page, PageRegistry};
use crate::shell::partial::PartialLoader;

/// Orchestrates page changes: hide everything, load the target partial,
/// run its initializer, show it, keep the nav indicator consistent.
///
/// `navigate_to_page` never fails toward the caller; every error path
/// degrades to a visible fallback. It is not re-entrant: callers must
/// await one navigation before issuing the next.
pub struct NavigationManager {
    loader: PartialLoader,
    registry: PageRegistry,
    active_nav: Page,
}

impl NavigationManager {
    pub fn new(loader: PartialLoader, registry: PageRegistry) -> Self {
        Self {
            loader,
            registry,
            active_nav: Page::Home,
        }
    }

    /// The page the navigation UI currently highlights. Updated on every
    /// navigation, including failed ones.
    pub fn active_nav(&self) -> Page {
        self.active_nav
    }

    pub async fn navigate_to_page(&mut self, ctx: &mut AppContext, name: &str, is_initial_load: bool) {
        debug!("navigating to '{name}' (initial: {is_initial_load})");

        let Some(page) = Page::from_name(name) else {
            error!("invalid page name '{name}', falling back to home");
            ctx.session.nav_epoch += 1;
            ctx.containers.hide_all();
            ctx.containers.show(Page::Home.container_id());
            ctx.session.current_page = Page::Home;
            self.active_nav = Page::Home;
            return;
        };

        ctx.session.nav_epoch += 1;
        ctx.containers.hide_all();

        if self.load_page_content(ctx, page).await {
            ctx.containers.show(page.container_id());
            ctx.session.current_page = page;
            info!("shown page '{page}'");
        } else {
            // Degraded fallback: leave the error placeholder in the target
            // container (hidden) and show the home page instead.
            error!("failed to load content for '{page}', showing home as fallback");
            ctx.containers.show(Page::Home.container_id());
            ctx.session.current_page = Page::Home;
        }

        self.active_nav = page;
    }

    /// Fetch and inject the page's partial, then run its initializer.
    /// Returns false when the partial could not be loaded; the container
    /// then holds an error placeholder and no initializer runs.
    async fn load_page_content(&self, ctx: &mut AppContext, page: Page) -> bool {
        let container_id = page.container_id();

        let html = match self.loader.load(container_id).await {
            Ok(html) => html,
            Err(err) => {
                error!("error loading partial for '{container_id}': {err}");
                ctx.containers.inject_error(container_id);
                return false;
            }
        };

        ctx.containers.inject(container_id, html);
        self.registry.run(page, ctx);

        // The configuration page hosts a decoupled AI-assist subcomponent
        // that must re-arm against the fresh markup; its absence is fine.
        if page == Page::Configure {
            if let Some(hook) = ctx.ai_assist.as_mut() {
                let armed = hook.arm();
                if armed {
                    debug!("AI assist re-armed after configure injection");
                } else {
                    warn!("AI assist failed to arm");
                }
            }
        }

        true
    }
}
