//! Link click interception
//!
//! Decides whether a click inside the page should be routed internally
//! or left to the host's default handling. Clicks are classified from
//! the clicked node: the nearest enclosing anchor wins, and only
//! same-site relative links are routed.

use crate::dom::{Document, Node};

/// How a click should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Route internally to the linked page
    Navigate {
        /// Link target as written in the document
        href: String,
    },
    /// Not an internal link; leave it to the host
    PassThrough,
}

/// Whether the host's default click behavior should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAction {
    /// The engine handled the click
    Consumed,
    /// Let the host perform its default behavior
    Allow,
}

/// Classify a click on the node at `target`
pub fn classify(document: &Document, target: &[usize]) -> ClickAction {
    let Some(anchor) = document.closest(target, |el| el.tag_name == "a") else {
        return ClickAction::PassThrough;
    };
    let Some(href) = document
        .node_at(&anchor)
        .and_then(Node::as_element)
        .and_then(|el| el.get_attribute("href"))
    else {
        return ClickAction::PassThrough;
    };
    if is_routable(href) {
        ClickAction::Navigate { href: href.clone() }
    } else {
        ClickAction::PassThrough
    }
}

/// Check whether a link target stays within the site.
///
/// Hash-only links and anything carrying a scheme (https, mailto, ...)
/// are not routable.
pub fn is_routable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    !has_scheme(href)
}

fn has_scheme(href: &str) -> bool {
    match href.find(':') {
        Some(pos) => !href[..pos].contains(['/', '?', '#']),
        None => false,
    }
}
