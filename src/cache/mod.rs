//! Page cache
//!
//! Navigated and preloaded pages are kept as parsed documents so repeat
//! visits skip both the network and the parser. The cache is unbounded;
//! a static site's page set is small and known up front.

mod image;

pub use image::{shared, ImageCache, ImageEntry, SharedImageCache};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::dom::Document;

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCacheStats {
    /// Number of cached pages
    pub entries: usize,
    /// Lookup hits
    pub hits: u64,
    /// Lookup misses
    pub misses: u64,
}

/// Thread-safe cache of parsed pages, keyed by path
#[derive(Debug, Clone)]
pub struct PageCache {
    entries: Arc<RwLock<HashMap<String, Document>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl PageCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Look up a page, cloning the stored document
    pub fn get(&self, path: &str) -> Option<Document> {
        if let Ok(entries) = self.entries.read() {
            if let Some(document) = entries.get(path) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Page cache hit: {path}");
                return Some(document.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Check for a page without touching hit counters
    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(path))
            .unwrap_or(false)
    }

    /// Store a parsed page
    pub fn insert(&self, path: impl Into<String>, document: Document) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.into(), document);
        }
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all cached pages
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Current cache statistics
    pub fn stats(&self) -> PageCacheStats {
        PageCacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    fn page(title: &str) -> Document {
        dom::parse(&format!("<html><head><title>{title}</title></head></html>")).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let cache = PageCache::new();
        cache.insert("/index.html", page("Home"));
        let doc = cache.get("/index.html").unwrap();
        assert_eq!(doc.title().as_deref(), Some("Home"));
    }

    #[test]
    fn test_miss_returns_none() {
        let cache = PageCache::new();
        assert!(cache.get("/missing.html").is_none());
    }

    #[test]
    fn test_contains_does_not_count() {
        let cache = PageCache::new();
        cache.insert("/index.html", page("Home"));
        assert!(cache.contains("/index.html"));
        assert!(!cache.contains("/other.html"));
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_stats_track_lookups() {
        let cache = PageCache::new();
        cache.insert("/a.html", page("A"));
        cache.get("/a.html");
        cache.get("/a.html");
        cache.get("/b.html");
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = PageCache::new();
        let clone = cache.clone();
        cache.insert("/a.html", page("A"));
        assert!(clone.contains("/a.html"));
        clone.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let cache = PageCache::new();
        cache.insert("/a.html", page("Old"));
        cache.insert("/a.html", page("New"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/a.html").unwrap().title().as_deref(), Some("New"));
    }

    #[test]
    fn test_shared_image_cache_round_trip() {
        let images = shared();
        images.lock().unwrap().insert(
            "img/logo.png",
            ImageEntry::Loaded {
                width: 16,
                height: 16,
            },
        );
        assert!(images.lock().unwrap().contains("img/logo.png"));
    }
}
