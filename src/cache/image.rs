//! Image cache with bounded capacity
//!
//! Tracks which image URLs have been fetched and decoded. When the cache
//! is full the oldest entries are evicted first, keeping memory flat on
//! image-heavy pages.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use log::debug;

/// Maximum entries kept before eviction
const MAX_ENTRIES: usize = 100;

/// Outcome of loading one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEntry {
    /// Decoded successfully
    Loaded {
        /// Pixel width
        width: u32,
        /// Pixel height
        height: u32,
    },
    /// Fetch or decode failed
    Failed(String),
}

impl ImageEntry {
    /// Check whether this entry is a successful load
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageEntry::Loaded { .. })
    }
}

/// Insertion-ordered cache of image load results
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<String, ImageEntry>,
    order: VecDeque<String>,
    max_entries: usize,
}

impl ImageCache {
    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_limit(MAX_ENTRIES)
    }

    /// Create a cache with a custom capacity
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    /// Record a load result.
    ///
    /// Re-inserting a known URL replaces its entry without changing its
    /// position in the eviction order.
    pub fn insert(&mut self, url: impl Into<String>, entry: ImageEntry) {
        let url = url.into();
        if self.entries.insert(url.clone(), entry).is_some() {
            return;
        }
        self.order.push_back(url);
        while self.entries.len() > self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Evicting image cache entry: {oldest}");
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Look up a load result
    pub fn get(&self, url: &str) -> Option<&ImageEntry> {
        self.entries.get(url)
    }

    /// Check whether a URL has an entry
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Image cache shared across the engine and background loads
pub type SharedImageCache = Arc<Mutex<ImageCache>>;

/// Create a shared image cache
pub fn shared() -> SharedImageCache {
    Arc::new(Mutex::new(ImageCache::new()))
}
