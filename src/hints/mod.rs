//! Resource hints
//!
//! Inserts preconnect, prefetch, and preload links into the page head.
//! Recording a hint is synchronous; warming the hinted resource is a
//! separate fetch so callers never hold the view while waiting on the
//! network. Each hint is recorded once per URL, and a failed warm-up
//! still counts as hinted so it is not retried.

use std::collections::HashSet;

use log::debug;

use crate::dom::Node;
use crate::net::Fetcher;
use crate::page::PageView;
use crate::utils::error::HintError;

/// Resource type a preload targets, written into the link's as attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintKind {
    /// Stylesheet
    Style,
    /// Script
    Script,
    /// Web font
    Font,
    /// Image
    #[default]
    Image,
    /// HTML document
    Document,
}

impl HintKind {
    /// Value for the link's as attribute
    pub fn as_attr(&self) -> &'static str {
        match self {
            HintKind::Style => "style",
            HintKind::Script => "script",
            HintKind::Font => "font",
            HintKind::Image => "image",
            HintKind::Document => "document",
        }
    }
}

/// Result of recording a hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOutcome {
    /// The hint was recorded and its link inserted
    Added,
    /// The URL was hinted before; nothing was done
    AlreadyHinted,
}

/// Tracks issued hints and inserts their link elements
#[derive(Debug, Default)]
pub struct HintManager {
    preconnected: HashSet<String>,
    prefetched: HashSet<String>,
    preloaded: HashSet<String>,
}

impl HintManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint an early connection to an origin.
    ///
    /// Preconnect is link-only: the connection is the host's business,
    /// so there is nothing to warm.
    pub fn add_preconnect(&mut self, view: &mut PageView, origin: &str) -> HintOutcome {
        if !self.preconnected.insert(origin.to_string()) {
            return HintOutcome::AlreadyHinted;
        }
        let mut link = Node::element("link");
        if let Some(el) = link.as_element_mut() {
            el.set_attribute("rel", "preconnect");
            el.set_attribute("href", origin);
            el.set_attribute("crossorigin", "anonymous");
        }
        view.append_to_head(link);
        debug!("Preconnect hint: {origin}");
        HintOutcome::Added
    }

    /// Record a prefetch hint for a resource a later page will need
    pub fn add_prefetch(&mut self, view: &mut PageView, url: &str, kind: HintKind) -> HintOutcome {
        if !self.prefetched.insert(url.to_string()) {
            return HintOutcome::AlreadyHinted;
        }
        let mut link = Node::element("link");
        if let Some(el) = link.as_element_mut() {
            el.set_attribute("rel", "prefetch");
            el.set_attribute("href", url);
            el.set_attribute("as", kind.as_attr());
        }
        view.append_to_head(link);
        debug!("Prefetch hint ({}): {url}", kind.as_attr());
        HintOutcome::Added
    }

    /// Record a preload hint for a resource the current page needs soon
    pub fn add_preload(
        &mut self,
        view: &mut PageView,
        url: &str,
        kind: HintKind,
    ) -> HintOutcome {
        if !self.preloaded.insert(url.to_string()) {
            return HintOutcome::AlreadyHinted;
        }
        let mut link = Node::element("link");
        if let Some(el) = link.as_element_mut() {
            el.set_attribute("rel", "preload");
            el.set_attribute("href", url);
            el.set_attribute("as", kind.as_attr());
            if kind == HintKind::Font {
                el.set_attribute("type", "font/woff2");
                el.set_attribute("crossorigin", "anonymous");
            }
        }
        view.append_to_head(link);
        debug!("Preload hint ({}): {url}", kind.as_attr());
        HintOutcome::Added
    }
}

/// Warm a hinted resource so it is ready when the page asks for it
pub async fn warm<F: Fetcher>(fetcher: &F, url: &str) -> Result<(), HintError> {
    match fetcher.fetch(url).await {
        Ok(page) if page.is_success() => Ok(()),
        Ok(page) => Err(HintError::Load {
            url: url.to_string(),
            reason: format!("status {}", page.status()),
        }),
        Err(e) => Err(HintError::Load {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}
