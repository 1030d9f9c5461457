//! # PageHop - Instant Navigation for Static Sites
//!
//! A navigation engine that gives a static multi-page site the feel of
//! a single-page app: content swaps instead of full page loads, with
//! caching and preloading so most navigations never touch the network.
//!
//! ## Architecture
//!
//! The engine is organized into the following core modules:
//!
//! - **engine**: Top-level orchestration of startup and host events
//! - **router**: Navigation flow, content swapping, transition indicator
//! - **intercept**: Link click classification
//! - **preload**: Background page cache warming
//! - **images**: Lazy loading and batch image preloading
//! - **hints**: Preconnect, prefetch, and preload link management
//! - **cache**: Page and image caches
//! - **history**: Session history with state payloads
//! - **page**: Live page view shared across components
//! - **dom**: Owned document model and HTML parsing
//! - **net**: Fetcher abstraction and HTTP client
//! - **utils**: Shared utilities and error types

pub mod cache;
pub mod dom;
pub mod engine;
pub mod hints;
pub mod history;
pub mod images;
pub mod intercept;
pub mod net;
pub mod page;
pub mod preload;
pub mod router;
pub mod utils;

// Re-export main types for convenience
pub use engine::{EngineConfig, NavigationEngine};
pub use router::{Navigation, PageSource, Router};
pub use utils::error::{FetchError, HintError, NavError, Result};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "PageHop";
