//! Navigation engine
//!
//! Top-level component wiring the pieces together over one shared page
//! view:
//! - Bootstraps the page: transition assets, preconnect hints, the
//!   initial navigation, and background preloading
//! - Turns host events (clicks, history pops, scrolls, resizes) into
//!   router calls and view updates
//! - Runs the image optimizer after every applied navigation

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::cache::{self, SharedImageCache};
use crate::dom::{Document, Node};
use crate::hints::{self, HintKind, HintManager, HintOutcome};
use crate::history::HistoryState;
use crate::images::{self, ImageOptimizer};
use crate::intercept::{self, ClickAction, DefaultAction};
use crate::net::Fetcher;
use crate::page::{self, HostCapabilities, PageView, SharedPageView, Viewport};
use crate::page::{MENU_ICON_CLASS, SIDEBAR_CLASS};
use crate::preload::{PreloadConfig, Preloader};
use crate::router::{Navigation, Router, RouterConfig};
use crate::utils::error::{HintError, Result};
use crate::utils::Debouncer;

/// Class of the transition indicator element inserted at startup
pub const INDICATOR_CLASS: &str = "page-transition-indicator";
/// Container class of card thumbnail images preloaded at startup
const THUMBNAIL_CLASS: &str = "thumbnail";
/// Container class of branding images preloaded at startup
const LOGO_CLASS: &str = "logo";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page navigated to when the initial location is bare
    pub default_page: String,
    /// Viewport width below which the sidebar behaves as a mobile menu
    pub mobile_breakpoint: u32,
    /// Minimum spacing between handled scroll and resize events
    pub debounce: Duration,
    /// Origins preconnected at startup
    pub preconnect_origins: Vec<String>,
    /// Stylesheet holding the transition rules, inserted at startup
    pub transitions_stylesheet: String,
    /// Router tuning
    pub router: RouterConfig,
    /// Preloader tuning
    pub preload: PreloadConfig,
    /// Host features the engine adapts to
    pub capabilities: HostCapabilities,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page: "/index.html".to_string(),
            mobile_breakpoint: 768,
            debounce: Duration::from_millis(100),
            preconnect_origins: vec![
                "https://fonts.googleapis.com".to_string(),
                "https://fonts.gstatic.com".to_string(),
                "https://cdn.jsdelivr.net".to_string(),
            ],
            transitions_stylesheet: "./css/transitions.css".to_string(),
            router: RouterConfig::default(),
            preload: PreloadConfig::default(),
            capabilities: HostCapabilities::default(),
        }
    }
}

/// SPA-style navigation over a static multi-page site
pub struct NavigationEngine<F: Fetcher> {
    router: Router<F>,
    fetcher: Arc<F>,
    view: SharedPageView,
    hints: HintManager,
    optimizer: ImageOptimizer,
    image_cache: SharedImageCache,
    scroll_debouncer: Debouncer,
    resize_debouncer: Debouncer,
    config: EngineConfig,
    preload_task: Option<JoinHandle<usize>>,
}

impl<F: Fetcher> NavigationEngine<F> {
    /// Create an engine over the page the host currently shows
    pub fn new(fetcher: Arc<F>, document: Document, location: impl Into<String>) -> Self {
        Self::with_config(fetcher, document, location, EngineConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(
        fetcher: Arc<F>,
        document: Document,
        location: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        let view = page::shared(PageView::new(document, location));
        let viewport_height = view
            .lock()
            .map(|view| view.viewport().height as f32)
            .unwrap_or(720.0);
        let router = Router::with_config(Arc::clone(&fetcher), Arc::clone(&view), config.router.clone());
        let optimizer = ImageOptimizer::new(config.capabilities.intersection_observer, viewport_height);
        Self {
            router,
            fetcher,
            view,
            hints: HintManager::new(),
            optimizer,
            image_cache: cache::shared(),
            scroll_debouncer: Debouncer::new(config.debounce),
            resize_debouncer: Debouncer::new(config.debounce),
            config,
            preload_task: None,
        }
    }

    /// Shared page view
    pub fn view(&self) -> &SharedPageView {
        &self.view
    }

    /// The router driving navigations
    pub fn router(&self) -> &Router<F> {
        &self.router
    }

    /// Shared image cache
    pub fn image_cache(&self) -> &SharedImageCache {
        &self.image_cache
    }

    /// Prepare the page and warm the caches.
    ///
    /// Installs the transition assets and preconnect hints, navigates
    /// to the initial page, seeds the history, preloads branding
    /// images, and schedules the background page preload. Failures are
    /// logged; a broken network must not take the page down.
    pub async fn bootstrap(&mut self) {
        self.install_transition_assets();
        let origins = self.config.preconnect_origins.clone();
        for origin in &origins {
            self.preconnect(origin);
        }

        let path = self.initial_path();
        if let Err(e) = self.router.navigate(&path, false).await {
            warn!("Initial navigation to {path} failed: {e}");
        }
        if let Ok(mut history) = self.router.history().lock() {
            history.reset(&path);
        }
        self.ensure_active_item();
        self.after_apply();
        self.preload_branding_images().await;
        self.schedule_preload();
    }

    /// Handle a click anywhere in the page.
    ///
    /// Menu icon clicks toggle the mobile menu, clicks outside an open
    /// menu close it, and internal links are routed. Returns whether
    /// the host should still run its default behavior.
    pub async fn handle_click(&mut self, target: &[usize]) -> DefaultAction {
        let on_menu_icon = {
            let Ok(view) = self.view.lock() else {
                return DefaultAction::Allow;
            };
            view.document()
                .closest(target, |el| el.has_class(MENU_ICON_CLASS))
                .is_some()
        };
        if on_menu_icon {
            if let Ok(mut view) = self.view.lock() {
                view.toggle_menu();
            }
            return DefaultAction::Consumed;
        }

        if let Ok(mut view) = self.view.lock() {
            if view.is_menu_open() {
                let inside = view
                    .document()
                    .closest(target, |el| el.has_class(SIDEBAR_CLASS))
                    .is_some();
                if !inside {
                    view.set_menu_open(false);
                }
            }
        }

        let Some(href) = self.link_target(target) else {
            return DefaultAction::Allow;
        };
        if let Err(e) = self.route_to(&href).await {
            warn!("Navigation to {href} failed: {e}");
        }
        DefaultAction::Consumed
    }

    /// Handle a click on a sidebar link.
    ///
    /// Unlike [`handle_click`](Self::handle_click), a failed navigation
    /// hands the click back to the host so a full page load can take
    /// over.
    pub async fn handle_sidebar_click(&mut self, target: &[usize]) -> DefaultAction {
        let Some(href) = self.link_target(target) else {
            return DefaultAction::Allow;
        };
        match self.route_to(&href).await {
            Ok(_) => DefaultAction::Consumed,
            Err(e) => {
                warn!("Sidebar navigation to {href} failed: {e}");
                DefaultAction::Allow
            }
        }
    }

    /// Handle a history pop.
    ///
    /// Pops without a recorded state are ignored; the host is already
    /// showing the right page.
    pub async fn handle_pop_state(&mut self, state: Option<HistoryState>) {
        let Some(state) = state else {
            return;
        };
        match self.router.navigate(&state.path, false).await {
            Ok(Navigation::Applied { .. }) => self.after_apply(),
            Ok(Navigation::Superseded) => {}
            Err(e) => warn!("History navigation to {} failed: {e}", state.path),
        }
    }

    /// Go back one history entry, if there is one
    pub async fn back(&mut self) -> bool {
        let state = self
            .router
            .history()
            .lock()
            .ok()
            .and_then(|mut history| history.back());
        match state {
            Some(state) => {
                self.handle_pop_state(Some(state)).await;
                true
            }
            None => false,
        }
    }

    /// Go forward one history entry, if there is one
    pub async fn forward(&mut self) -> bool {
        let state = self
            .router
            .history()
            .lock()
            .ok()
            .and_then(|mut history| history.forward());
        match state {
            Some(state) => {
                self.handle_pop_state(Some(state)).await;
                true
            }
            None => false,
        }
    }

    /// Handle a scroll event, promoting images that came into view.
    ///
    /// Bursts are debounced; dropped events return zero.
    pub fn handle_scroll(&mut self, scroll_y: f32) -> usize {
        if !self.scroll_debouncer.accept() {
            return 0;
        }
        match self.view.lock() {
            Ok(mut view) => {
                view.set_scroll_y(scroll_y);
                self.optimizer.handle_scroll(&mut view)
            }
            Err(_) => 0,
        }
    }

    /// Handle a window resize.
    ///
    /// Growing past the mobile breakpoint closes the mobile menu.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if !self.resize_debouncer.accept() {
            return;
        }
        if let Ok(mut view) = self.view.lock() {
            view.set_viewport(Viewport { width, height });
            if width > self.config.mobile_breakpoint {
                view.set_menu_open(false);
            }
        }
    }

    /// Toggle the mobile menu, returning its new state
    pub fn toggle_menu(&mut self) -> bool {
        self.view
            .lock()
            .map(|mut view| view.toggle_menu())
            .unwrap_or(false)
    }

    /// Hint an early connection to an origin the page will talk to
    pub fn preconnect(&mut self, origin: &str) -> HintOutcome {
        match self.view.lock() {
            Ok(mut view) => self.hints.add_preconnect(&mut view, origin),
            Err(_) => HintOutcome::AlreadyHinted,
        }
    }

    /// Hint and warm a likely future navigation
    pub async fn prefetch_page(&mut self, url: &str) -> Result<HintOutcome, HintError> {
        let outcome = match self.view.lock() {
            Ok(mut view) => self.hints.add_prefetch(&mut view, url, HintKind::Document),
            Err(_) => return Ok(HintOutcome::AlreadyHinted),
        };
        if outcome == HintOutcome::Added {
            hints::warm(self.fetcher.as_ref(), url).await?;
        }
        Ok(outcome)
    }

    /// Hint and warm a resource the current page needs soon
    pub async fn preload_resource(
        &mut self,
        url: &str,
        kind: HintKind,
    ) -> Result<HintOutcome, HintError> {
        let outcome = match self.view.lock() {
            Ok(mut view) => self.hints.add_preload(&mut view, url, kind),
            Err(_) => return Ok(HintOutcome::AlreadyHinted),
        };
        if outcome == HintOutcome::Added {
            hints::warm(self.fetcher.as_ref(), url).await?;
        }
        Ok(outcome)
    }

    /// Wait for the scheduled background preload to finish, returning
    /// how many pages it warmed
    pub async fn await_preload(&mut self) -> Option<usize> {
        match self.preload_task.take() {
            Some(task) => task.await.ok(),
            None => None,
        }
    }

    /// Classify a click and extract its internal link target
    fn link_target(&self, target: &[usize]) -> Option<String> {
        let view = self.view.lock().ok()?;
        match intercept::classify(view.document(), target) {
            ClickAction::Navigate { href } => Some(href),
            ClickAction::PassThrough => None,
        }
    }

    /// Navigate to an internal link with optimistic feedback first
    async fn route_to(&mut self, href: &str) -> Result<Navigation> {
        if let Ok(mut view) = self.view.lock() {
            page::update_active_item(view.document_mut(), href);
            if view.viewport().width < self.config.mobile_breakpoint {
                view.set_menu_open(false);
            }
            view.scroll_to_top();
        }
        let outcome = self.router.navigate(href, true).await?;
        if matches!(outcome, Navigation::Applied { .. }) {
            self.after_apply();
        }
        Ok(outcome)
    }

    /// Re-run the image optimizer over freshly applied content
    fn after_apply(&mut self) {
        if let Ok(mut view) = self.view.lock() {
            self.optimizer.reset();
            self.optimizer.optimize(&mut view);
        }
    }

    fn install_transition_assets(&self) {
        let Ok(mut view) = self.view.lock() else {
            return;
        };
        let mut link = Node::element("link");
        if let Some(el) = link.as_element_mut() {
            el.set_attribute("rel", "stylesheet");
            el.set_attribute("href", self.config.transitions_stylesheet.as_str());
        }
        view.append_to_head(link);

        let mut indicator = Node::element("div");
        if let Some(el) = indicator.as_element_mut() {
            el.set_attribute("class", INDICATOR_CLASS);
        }
        view.append_to_body(indicator);
    }

    fn initial_path(&self) -> String {
        let location = self
            .view
            .lock()
            .map(|view| view.location().to_string())
            .unwrap_or_default();
        if location.is_empty() || location == "/" {
            self.config.default_page.clone()
        } else {
            location
        }
    }

    /// Fall back to marking the current page's sidebar item when the
    /// initial navigation left none active
    fn ensure_active_item(&self) {
        let Ok(mut view) = self.view.lock() else {
            return;
        };
        if page::has_active_item(view.document()) {
            return;
        }
        let filename = {
            let location = view.location();
            let name = location.rsplit('/').next().unwrap_or(location);
            if name.is_empty() {
                "index.html".to_string()
            } else {
                name.to_string()
            }
        };
        page::update_active_item(view.document_mut(), &filename);
    }

    /// Fetch and decode the page's branding images up front
    async fn preload_branding_images(&self) -> usize {
        let urls = {
            let Ok(view) = self.view.lock() else {
                return 0;
            };
            branding_image_urls(view.document())
        };
        if urls.is_empty() {
            return 0;
        }
        images::preload_images(self.fetcher.as_ref(), &urls, &self.image_cache).await
    }

    /// Start the background page preload after the configured delay
    fn schedule_preload(&mut self) {
        let mut preload_config = self.config.preload.clone();
        preload_config.use_idle = self.config.capabilities.idle_callback;
        let preloader = Preloader::new(
            Arc::clone(&self.fetcher),
            self.router.cache().clone(),
            preload_config,
        );
        let delay = preloader.start_delay();
        self.preload_task = Some(tokio::spawn(async move {
            sleep(delay).await;
            preloader.run().await
        }));
    }
}

/// Sources of images inside thumbnail and logo containers
fn branding_image_urls(document: &Document) -> Vec<String> {
    let mut urls = Vec::new();
    for path in document.find_all(|el| el.tag_name == "img") {
        let branded = document
            .closest(&path, |el| el.has_class(THUMBNAIL_CLASS) || el.has_class(LOGO_CLASS))
            .is_some();
        if !branded {
            continue;
        }
        let src = document
            .node_at(&path)
            .and_then(Node::as_element)
            .and_then(|el| el.get_attribute("src"));
        if let Some(src) = src {
            if !src.is_empty() {
                urls.push(src.clone());
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{self, ElementData};
    use crate::net::{FetchedPage, Fetcher};
    use crate::utils::error::FetchError;
    use std::collections::HashMap;

    struct SiteFetcher {
        pages: HashMap<String, String>,
    }

    impl SiteFetcher {
        fn new() -> Self {
            let mut pages = HashMap::new();
            pages.insert("/index.html".to_string(), page_html("Home", "Welcome home"));
            pages.insert("cases.html".to_string(), page_html("Cases", "All cases"));
            pages.insert("quiz.html".to_string(), page_html("Quiz", "Daily quiz"));
            Self { pages }
        }
    }

    impl Fetcher for SiteFetcher {
        async fn fetch(&self, path: &str) -> std::result::Result<FetchedPage, FetchError> {
            match self.pages.get(path) {
                Some(body) => Ok(FetchedPage::new(200, body.clone())),
                None => Ok(FetchedPage::new(404, "")),
            }
        }
    }

    fn page_html(title: &str, text: &str) -> String {
        format!(
            "<html><head><title>{title}</title></head><body>\
             <div class=\"content\"><p>{text}</p></div></body></html>"
        )
    }

    fn shell_doc() -> Document {
        dom::parse(
            "<html><head><title>Shell</title></head><body>\
             <div class=\"menu-icon\"><span>=</span></div>\
             <div class=\"sidebar\">\
             <div class=\"sidebar-item\"><a href=\"index.html\">Home</a></div>\
             <div class=\"sidebar-item\"><a href=\"cases.html\">Cases</a></div>\
             <div class=\"sidebar-item\"><a href=\"https://example.com\">Docs</a></div>\
             <div class=\"sidebar-item\"><a href=\"archive.html\">Archive</a></div>\
             </div>\
             <div class=\"content\"><p>Loading</p></div>\
             </body></html>",
        )
        .unwrap()
    }

    fn engine() -> NavigationEngine<SiteFetcher> {
        NavigationEngine::new(Arc::new(SiteFetcher::new()), shell_doc(), "/")
    }

    fn find_in_view<P>(engine: &NavigationEngine<SiteFetcher>, pred: P) -> Vec<usize>
    where
        P: Fn(&ElementData) -> bool,
    {
        let view = engine.view().lock().unwrap();
        view.document().find_first(pred).unwrap()
    }

    fn anchor_path(engine: &NavigationEngine<SiteFetcher>, href: &str) -> Vec<usize> {
        let view = engine.view().lock().unwrap();
        view.document()
            .find_first(|el| {
                el.tag_name == "a" && el.get_attribute("href").map(String::as_str) == Some(href)
            })
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_prepares_page() {
        let mut engine = engine();
        engine.bootstrap().await;

        let view = engine.view().lock().unwrap();
        assert_eq!(view.location(), "/index.html");
        assert_eq!(view.title(), "Home");
        assert_eq!(view.content_markup().as_deref(), Some("<p>Welcome home</p>"));

        let head = view.document().head().unwrap();
        let links = view.document().node_at(&head).unwrap().children.len();
        // title + stylesheet + three preconnects
        assert_eq!(links, 5);
        assert!(view
            .document()
            .find_first(|el| el.has_class(INDICATOR_CLASS))
            .is_some());
        drop(view);

        let history = engine.router().history().lock().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().path, "/index.html");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_marks_active_item() {
        let mut engine = engine();
        engine.bootstrap().await;
        let view = engine.view().lock().unwrap();
        assert!(page::has_active_item(view.document()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_internal_link_navigates() {
        let mut engine = engine();
        engine.bootstrap().await;

        let target = anchor_path(&engine, "cases.html");
        let action = engine.handle_click(&target).await;
        assert_eq!(action, DefaultAction::Consumed);

        let view = engine.view().lock().unwrap();
        assert_eq!(view.location(), "cases.html");
        assert_eq!(view.title(), "Cases");
        drop(view);
        assert!(engine.router().history().lock().unwrap().can_go_back());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_external_link_is_left_to_host() {
        let mut engine = engine();
        engine.bootstrap().await;

        let target = anchor_path(&engine, "https://example.com");
        let action = engine.handle_click(&target).await;
        assert_eq!(action, DefaultAction::Allow);
        assert_eq!(engine.view().lock().unwrap().location(), "/index.html");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sidebar_click_routes_internal_link() {
        let mut engine = engine();
        engine.bootstrap().await;

        let target = anchor_path(&engine, "cases.html");
        let action = engine.handle_sidebar_click(&target).await;
        assert_eq!(action, DefaultAction::Consumed);
        assert_eq!(engine.view().lock().unwrap().location(), "cases.html");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sidebar_navigation_falls_back_to_host() {
        let mut engine = engine();
        engine.bootstrap().await;

        // archive.html is not served, so routing fails with a 404
        let target = anchor_path(&engine, "archive.html");
        let action = engine.handle_sidebar_click(&target).await;
        assert_eq!(action, DefaultAction::Allow);

        let view = engine.view().lock().unwrap();
        assert_eq!(view.location(), "/index.html");
        assert_eq!(view.title(), "Home");
        assert!(!view.is_loading());
        drop(view);
        assert_eq!(engine.router().history().lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_menu_icon_toggles_menu() {
        let mut engine = engine();
        engine.bootstrap().await;

        let icon = find_in_view(&engine, |el| el.has_class(MENU_ICON_CLASS));
        assert_eq!(engine.handle_click(&icon).await, DefaultAction::Consumed);
        assert!(engine.view().lock().unwrap().is_menu_open());
        assert_eq!(engine.handle_click(&icon).await, DefaultAction::Consumed);
        assert!(!engine.view().lock().unwrap().is_menu_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_outside_open_menu_closes_it() {
        let mut engine = engine();
        engine.bootstrap().await;
        engine.toggle_menu();

        let content = find_in_view(&engine, |el| el.has_class("content"));
        let action = engine.handle_click(&content).await;
        assert_eq!(action, DefaultAction::Allow);
        assert!(!engine.view().lock().unwrap().is_menu_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrow_viewport_click_closes_menu() {
        let mut engine = engine();
        engine.bootstrap().await;
        engine.handle_resize(375, 667);
        engine.toggle_menu();

        let target = anchor_path(&engine, "cases.html");
        engine.handle_click(&target).await;
        assert!(!engine.view().lock().unwrap().is_menu_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_past_breakpoint_closes_menu() {
        let mut engine = engine();
        engine.bootstrap().await;
        engine.toggle_menu();

        engine.handle_resize(1024, 768);
        assert!(!engine.view().lock().unwrap().is_menu_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_events_are_debounced() {
        let mut engine = engine();
        engine.bootstrap().await;

        engine.handle_resize(1024, 768);
        engine.handle_resize(500, 600);
        // second resize arrived within the debounce window
        assert_eq!(engine.view().lock().unwrap().viewport().width, 1024);

        tokio::time::sleep(Duration::from_millis(150)).await;
        engine.handle_resize(500, 600);
        assert_eq!(engine.view().lock().unwrap().viewport().width, 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_returns_to_previous_page() {
        let mut engine = engine();
        engine.bootstrap().await;

        let target = anchor_path(&engine, "cases.html");
        engine.handle_click(&target).await;
        assert!(engine.back().await);
        assert_eq!(engine.view().lock().unwrap().location(), "/index.html");
        assert!(engine.forward().await);
        assert_eq!(engine.view().lock().unwrap().location(), "cases.html");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_without_state_is_ignored() {
        let mut engine = engine();
        engine.bootstrap().await;
        engine.handle_pop_state(None).await;
        assert_eq!(engine.view().lock().unwrap().location(), "/index.html");
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_preload_warms_cache() {
        let mut config = EngineConfig::default();
        config.preload.pages = vec!["cases.html".to_string(), "quiz.html".to_string()];
        let mut engine = NavigationEngine::with_config(
            Arc::new(SiteFetcher::new()),
            shell_doc(),
            "/",
            config,
        );
        engine.bootstrap().await;

        assert_eq!(engine.await_preload().await, Some(2));
        assert!(engine.router().cache().contains("cases.html"));
        assert!(engine.router().cache().contains("quiz.html"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_page_records_once() {
        let mut engine = engine();
        engine.bootstrap().await;

        let first = engine.prefetch_page("quiz.html").await.unwrap();
        assert_eq!(first, HintOutcome::Added);
        let second = engine.prefetch_page("quiz.html").await.unwrap();
        assert_eq!(second, HintOutcome::AlreadyHinted);
    }
}
