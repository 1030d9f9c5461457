//! Background page preloading
//!
//! Warms the page cache with the site's main pages so first visits feel
//! like repeat visits. Preloading runs sequentially and yields to the
//! host between fetches so it never competes with user navigation.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::cache::PageCache;
use crate::dom;
use crate::net::Fetcher;
use crate::utils::error::{FetchError, NavError, Result};

/// Preloader tuning knobs
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Pages warmed after startup, in order
    pub pages: Vec<String>,
    /// Delay after startup before preloading begins
    pub start_delay: Duration,
    /// Pause between fetches when idle scheduling is unavailable
    pub step_delay: Duration,
    /// Yield to the host between fetches instead of sleeping
    pub use_idle: bool,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            pages: [
                "index.html",
                "dashboard.html",
                "community.html",
                "search.html",
                "learning.html",
                "quiz.html",
                "cases.html",
                "leaderboard.html",
                "settings.html",
            ]
            .iter()
            .map(|page| page.to_string())
            .collect(),
            start_delay: Duration::from_secs(1),
            step_delay: Duration::from_millis(100),
            use_idle: true,
        }
    }
}

/// Sequential page cache warmer
#[derive(Debug)]
pub struct Preloader<F: Fetcher> {
    fetcher: Arc<F>,
    cache: PageCache,
    config: PreloadConfig,
}

impl<F: Fetcher> Preloader<F> {
    /// Create a preloader warming `cache` through `fetcher`
    pub fn new(fetcher: Arc<F>, cache: PageCache, config: PreloadConfig) -> Self {
        Self {
            fetcher,
            cache,
            config,
        }
    }

    /// Delay the caller should wait before starting the run
    pub fn start_delay(&self) -> Duration {
        self.config.start_delay
    }

    /// Warm every configured page, returning how many were fetched.
    ///
    /// Already-cached pages are skipped without pausing. Failures are
    /// logged and do not stop the run.
    pub async fn run(&self) -> usize {
        let mut warmed = 0;
        for path in &self.config.pages {
            if self.cache.contains(path) {
                continue;
            }
            self.idle_pause().await;
            match self.warm(path).await {
                Ok(()) => {
                    debug!("Preloaded {path}");
                    warmed += 1;
                }
                Err(e) => warn!("Preload failed for {path}: {e}"),
            }
        }
        warmed
    }

    /// Fetch, parse, and cache one page
    async fn warm(&self, path: &str) -> Result<()> {
        let fetched = self.fetcher.fetch(path).await?;
        if !fetched.is_success() {
            return Err(NavError::Fetch(FetchError::Status {
                status: fetched.status(),
                url: path.to_string(),
            }));
        }
        let document = dom::parse_bytes(fetched.body())?;
        self.cache.insert(path, document);
        Ok(())
    }

    async fn idle_pause(&self) {
        if self.config.use_idle {
            tokio::task::yield_now().await;
        } else {
            sleep(self.config.step_delay).await;
        }
    }
}

impl<F: Fetcher> Clone for Preloader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}
