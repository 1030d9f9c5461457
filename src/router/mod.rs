//! Client-side router
//!
//! Drives page navigation without full page loads:
//! - Serves repeat visits from the page cache
//! - Fetches and parses unseen pages, then caches them
//! - Swaps the content region and updates title, history, and the
//!   active sidebar item in one step
//! - Tracks overlapping navigations so only the newest one lands

mod transition;

pub use transition::{TransitionIndicator, TransitionPhase, TransitionTimings};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use tokio::time::{sleep, timeout};

use crate::cache::PageCache;
use crate::dom::{self, Document};
use crate::history::{HistoryState, SessionHistory};
use crate::net::{FetchedPage, Fetcher};
use crate::page::{self, SharedPageView};
use crate::utils::error::{FetchError, NavError, Result};

/// Router tuning knobs
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// How long a fetch may run before the spinner is shown
    pub spinner_threshold: Duration,
    /// Artificial delay on cache hits so the loading state is visible
    pub cache_hit_delay: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            spinner_threshold: Duration::from_millis(50),
            cache_hit_delay: Duration::from_millis(100),
        }
    }
}

/// Where an applied page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Served from the page cache
    Cache,
    /// Fetched over the network
    Network,
}

/// Outcome of a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The page was applied to the view
    Applied {
        /// Where the page came from
        source: PageSource,
    },
    /// A newer navigation started before this one landed; the view was
    /// left untouched
    Superseded,
}

/// Navigation driver over a shared page view
///
/// Cheap to clone; clones share the cache, history, view, and the
/// navigation generation counter.
#[derive(Debug)]
pub struct Router<F: Fetcher> {
    fetcher: Arc<F>,
    cache: PageCache,
    view: SharedPageView,
    history: Arc<Mutex<SessionHistory>>,
    indicator: TransitionIndicator,
    generation: Arc<AtomicU64>,
    config: RouterConfig,
}

impl<F: Fetcher> Router<F> {
    /// Create a router with default configuration
    pub fn new(fetcher: Arc<F>, view: SharedPageView) -> Self {
        Self::with_config(fetcher, view, RouterConfig::default())
    }

    /// Create a router with custom configuration
    pub fn with_config(fetcher: Arc<F>, view: SharedPageView, config: RouterConfig) -> Self {
        Self {
            fetcher,
            cache: PageCache::new(),
            view,
            history: Arc::new(Mutex::new(SessionHistory::new())),
            indicator: TransitionIndicator::new(),
            generation: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Page cache shared with preloading
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Session history
    pub fn history(&self) -> &Arc<Mutex<SessionHistory>> {
        &self.history
    }

    /// Transition indicator
    pub fn indicator(&self) -> &TransitionIndicator {
        &self.indicator
    }

    /// Shared page view
    pub fn view(&self) -> &SharedPageView {
        &self.view
    }

    /// Navigate to `path`, applying the page to the view.
    ///
    /// Cached pages are applied after a short fixed delay; uncached
    /// pages are fetched, parsed, and cached first. When a newer
    /// navigation starts while this one is in flight, the fetched page
    /// still lands in the cache but the view is left to the newer
    /// navigation and [`Navigation::Superseded`] is returned.
    pub async fn navigate(&self, path: &str, record_history: bool) -> Result<Navigation> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Navigating to {path}");

        if let Ok(mut view) = self.view.lock() {
            view.set_loading(true);
        }
        self.indicator.begin_loading();

        let (document, source) = match self.cache.get(path) {
            Some(document) => {
                sleep(self.config.cache_hit_delay).await;
                (document, PageSource::Cache)
            }
            None => {
                let fetched = match self.fetch_with_spinner(path, generation).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        self.cleanup(generation);
                        return Err(e.into());
                    }
                };
                if !fetched.is_success() {
                    self.cleanup(generation);
                    return Err(NavError::Fetch(FetchError::Status {
                        status: fetched.status(),
                        url: path.to_string(),
                    }));
                }
                let document = match dom::parse_bytes(fetched.body()) {
                    Ok(document) => document,
                    Err(e) => {
                        self.cleanup(generation);
                        return Err(e);
                    }
                };
                // cache even if this navigation ends up superseded
                self.cache.insert(path, document.clone());
                (document, PageSource::Network)
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Navigation to {path} superseded");
            return Ok(Navigation::Superseded);
        }

        self.apply(path, &document, record_history);
        self.indicator.hide_spinner();

        let indicator = self.indicator.clone();
        tokio::spawn(async move {
            indicator.play_completion().await;
        });

        Ok(Navigation::Applied { source })
    }

    /// Fetch a page, showing the spinner once the fetch outlives the
    /// configured threshold. The spinner belongs to the newest
    /// navigation; a fetch that has already been superseded runs to
    /// completion without touching it.
    async fn fetch_with_spinner(
        &self,
        path: &str,
        generation: u64,
    ) -> std::result::Result<FetchedPage, FetchError> {
        let fetch = self.fetcher.fetch(path);
        let mut fetch = std::pin::pin!(fetch);
        match timeout(self.config.spinner_threshold, &mut fetch).await {
            Ok(result) => result,
            Err(_) => {
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.indicator.show_spinner();
                }
                fetch.await
            }
        }
    }

    /// Apply a page to the view under a single lock
    fn apply(&self, path: &str, incoming: &Document, record_history: bool) {
        if let Ok(mut view) = self.view.lock() {
            view.swap_content(incoming);
            if let Some(title) = incoming.title() {
                view.set_title(title);
            }
            view.set_location(path);
            if record_history {
                if let Ok(mut history) = self.history.lock() {
                    history.push(HistoryState::new(path));
                }
            }
            page::update_active_item(view.document_mut(), path);
            view.set_loading(false);
        }
    }

    /// Clear loading state after a failed navigation, unless a newer
    /// navigation owns the view
    fn cleanup(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        if let Ok(mut view) = self.view.lock() {
            view.set_loading(false);
        }
        self.indicator.reset();
    }
}

impl<F: Fetcher> Clone for Router<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            cache: self.cache.clone(),
            view: Arc::clone(&self.view),
            history: Arc::clone(&self.history),
            indicator: self.indicator.clone(),
            generation: Arc::clone(&self.generation),
            config: self.config.clone(),
        }
    }
}
