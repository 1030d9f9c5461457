//! Live page state
//!
//! A [`PageView`] is the engine's picture of the page currently shown:
//! the document tree, the location it was loaded from, and the scroll
//! and viewport geometry. Menu and loading state are stored as classes
//! on the document itself so there is a single source of truth.

use std::sync::{Arc, Mutex};

use crate::dom::{Document, Node, NodePath};

/// Class of the swappable content region
pub const CONTENT_CLASS: &str = "content";
/// Class set on the content region while a navigation is in flight
pub const LOADING_CLASS: &str = "loading";
/// Class of the navigation sidebar
pub const SIDEBAR_CLASS: &str = "sidebar";
/// Class of one sidebar navigation item
pub const SIDEBAR_ITEM_CLASS: &str = "sidebar-item";
/// Class marking the sidebar item for the current page
pub const ACTIVE_CLASS: &str = "active";
/// Class set on the sidebar while the mobile menu is open
pub const MENU_OPEN_CLASS: &str = "open";
/// Class of the mobile menu toggle button
pub const MENU_ICON_CLASS: &str = "menu-icon";

/// Window dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Optional host features the engine adapts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Viewport intersection tracking for lazy images
    pub intersection_observer: bool,
    /// Idle scheduling for background preloads
    pub idle_callback: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
            idle_callback: true,
        }
    }
}

/// The page currently presented to the user
#[derive(Debug, Clone)]
pub struct PageView {
    document: Document,
    title: String,
    location: String,
    scroll_y: f32,
    viewport: Viewport,
}

impl PageView {
    /// Create a view over a parsed document at `location`
    pub fn new(document: Document, location: impl Into<String>) -> Self {
        let title = document.title().unwrap_or_default();
        Self {
            document,
            title,
            location: location.into(),
            scroll_y: 0.0,
            viewport: Viewport::default(),
        }
    }

    /// The current document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current document, mutable
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Page title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the page title, updating the title element when present
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if let Some(path) = self.document.find_first(|el| el.tag_name == "title") {
            if let Some(node) = self.document.node_at_mut(&path) {
                node.children = vec![Node::text(self.title.clone())];
            }
        }
    }

    /// Path the view currently shows
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Set the current path
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Vertical scroll position
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Set the vertical scroll position
    pub fn set_scroll_y(&mut self, scroll_y: f32) {
        self.scroll_y = scroll_y;
    }

    /// Scroll back to the top of the page
    pub fn scroll_to_top(&mut self) {
        self.scroll_y = 0.0;
    }

    /// Window dimensions
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Set the window dimensions
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Path to the content region, if the page has one
    pub fn content_path(&self) -> Option<NodePath> {
        self.document.find_first(|el| el.has_class(CONTENT_CLASS))
    }

    /// Serialized markup of the content region
    pub fn content_markup(&self) -> Option<String> {
        let path = self.content_path()?;
        self.document.node_at(&path).map(Node::inner_markup)
    }

    /// Replace the content region's children with those from `incoming`.
    ///
    /// Returns false without touching the tree when either document
    /// lacks a content region.
    pub fn swap_content(&mut self, incoming: &Document) -> bool {
        let Some(theirs) = incoming.find_first(|el| el.has_class(CONTENT_CLASS)) else {
            return false;
        };
        let Some(children) = incoming.node_at(&theirs).map(|node| node.children.clone()) else {
            return false;
        };
        let Some(ours) = self.content_path() else {
            return false;
        };
        match self.document.node_at_mut(&ours) {
            Some(node) => {
                node.children = children;
                true
            }
            None => false,
        }
    }

    /// Mark or unmark the content region as loading
    pub fn set_loading(&mut self, loading: bool) {
        let Some(path) = self.content_path() else {
            return;
        };
        if let Some(el) = self.document.node_at_mut(&path).and_then(Node::as_element_mut) {
            if loading {
                el.add_class(LOADING_CLASS);
            } else {
                el.remove_class(LOADING_CLASS);
            }
        }
    }

    /// Check whether the content region is marked loading
    pub fn is_loading(&self) -> bool {
        self.content_path()
            .and_then(|path| self.document.node_at(&path))
            .and_then(Node::as_element)
            .map(|el| el.has_class(LOADING_CLASS))
            .unwrap_or(false)
    }

    /// Check whether the mobile menu is open
    pub fn is_menu_open(&self) -> bool {
        self.document
            .find_first(|el| el.has_class(SIDEBAR_CLASS))
            .and_then(|path| self.document.node_at(&path))
            .and_then(Node::as_element)
            .map(|el| el.has_class(MENU_OPEN_CLASS))
            .unwrap_or(false)
    }

    /// Toggle the mobile menu, returning its new state
    pub fn toggle_menu(&mut self) -> bool {
        let open = !self.is_menu_open();
        self.set_menu_open(open);
        open
    }

    /// Open or close the mobile menu
    pub fn set_menu_open(&mut self, open: bool) {
        let Some(path) = self.document.find_first(|el| el.has_class(SIDEBAR_CLASS)) else {
            return;
        };
        if let Some(el) = self.document.node_at_mut(&path).and_then(Node::as_element_mut) {
            if open {
                el.add_class(MENU_OPEN_CLASS);
            } else {
                el.remove_class(MENU_OPEN_CLASS);
            }
        }
    }

    /// Append a node to the document head
    pub fn append_to_head(&mut self, node: Node) -> bool {
        let Some(path) = self.document.head() else {
            return false;
        };
        match self.document.node_at_mut(&path) {
            Some(head) => {
                head.add_child(node);
                true
            }
            None => false,
        }
    }

    /// Append a node to the document body
    pub fn append_to_body(&mut self, node: Node) -> bool {
        let Some(path) = self.document.body() else {
            return false;
        };
        match self.document.node_at_mut(&path) {
            Some(body) => {
                body.add_child(node);
                true
            }
            None => false,
        }
    }
}

/// Page view shared across the router and the engine
pub type SharedPageView = Arc<Mutex<PageView>>;

/// Create a shared page view
pub fn shared(view: PageView) -> SharedPageView {
    Arc::new(Mutex::new(view))
}

/// Mark the sidebar item whose link points at `path` as active.
///
/// All items are cleared first and at most one item is marked: the
/// first whose link matches the path by filename, by full path, or as
/// a path suffix. Returns true when a match was found.
pub fn update_active_item(document: &mut Document, path: &str) -> bool {
    let filename = path.rsplit('/').next().unwrap_or(path).to_string();
    let items = document.find_all(|el| el.has_class(SIDEBAR_ITEM_CLASS));

    for item in &items {
        if let Some(el) = document.node_at_mut(item).and_then(Node::as_element_mut) {
            el.remove_class(ACTIVE_CLASS);
        }
    }

    for item in &items {
        let Some(node) = document.node_at(item) else {
            continue;
        };
        let Some(anchor) = node.find_first(|el| el.tag_name == "a") else {
            continue;
        };
        let Some(href) = resolve_href(node, &anchor) else {
            continue;
        };
        if href == filename
            || href == path
            || path.ends_with(&format!("/{href}"))
            || path.ends_with(&format!("\\{href}"))
        {
            if let Some(el) = document.node_at_mut(item).and_then(Node::as_element_mut) {
                el.add_class(ACTIVE_CLASS);
            }
            return true;
        }
    }
    false
}

fn resolve_href(item: &Node, anchor: &NodePath) -> Option<String> {
    let mut node = item;
    for &index in anchor {
        node = node.children.get(index)?;
    }
    node.as_element()?.get_attribute("href").cloned()
}

/// Check whether any sidebar item is marked active
pub fn has_active_item(document: &Document) -> bool {
    document
        .find_first(|el| el.has_class(SIDEBAR_ITEM_CLASS) && el.has_class(ACTIVE_CLASS))
        .is_some()
}
