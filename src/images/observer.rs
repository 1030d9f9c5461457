//! Viewport entry tracking
//!
//! Headless stand-in for intersection tracking: observed targets carry
//! an estimated vertical position, and a target "enters" once the band
//! covered by the viewport plus a margin reaches it.

use crate::dom::NodePath;

#[derive(Debug, Clone, PartialEq)]
struct Target {
    path: NodePath,
    y: f32,
}

/// Tracks which observed targets have scrolled into view
#[derive(Debug)]
pub struct ViewportObserver {
    targets: Vec<Target>,
    viewport_height: f32,
    scroll_y: f32,
    margin: f32,
}

impl ViewportObserver {
    /// Create an observer for a viewport of `viewport_height` pixels
    pub fn new(viewport_height: f32) -> Self {
        Self {
            targets: Vec::new(),
            viewport_height,
            scroll_y: 0.0,
            margin: 50.0,
        }
    }

    /// Extra margin around the viewport that counts as visible
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Start observing a target at an estimated vertical position.
    ///
    /// Observing an already-observed target updates its position.
    pub fn observe(&mut self, path: NodePath, y: f32) {
        if let Some(target) = self.targets.iter_mut().find(|t| t.path == path) {
            target.y = y;
            return;
        }
        self.targets.push(Target { path, y });
    }

    /// Stop observing a target
    pub fn unobserve(&mut self, path: &[usize]) {
        self.targets.retain(|t| t.path != path);
    }

    /// Record a new viewport height
    pub fn update_viewport(&mut self, viewport_height: f32) {
        self.viewport_height = viewport_height;
    }

    /// Record a new scroll position
    pub fn update_scroll(&mut self, scroll_y: f32) {
        self.scroll_y = scroll_y;
    }

    /// Targets now within the visible band, each reported once.
    ///
    /// Entered targets are removed from the observed set.
    pub fn take_entered(&mut self) -> Vec<NodePath> {
        let top = self.scroll_y - self.margin;
        let bottom = self.scroll_y + self.viewport_height + self.margin;
        let mut entered = Vec::new();
        self.targets.retain(|target| {
            if target.y >= top && target.y <= bottom {
                entered.push(target.path.clone());
                false
            } else {
                true
            }
        });
        entered
    }

    /// Number of targets still observed
    pub fn observed_count(&self) -> usize {
        self.targets.len()
    }

    /// Drop all observed targets
    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_targets_enter_immediately() {
        let mut observer = ViewportObserver::new(720.0);
        observer.observe(vec![0], 100.0);
        observer.observe(vec![1], 2000.0);
        let entered = observer.take_entered();
        assert_eq!(entered, vec![vec![0]]);
        assert_eq!(observer.observed_count(), 1);
    }

    #[test]
    fn test_scroll_brings_targets_in() {
        let mut observer = ViewportObserver::new(720.0);
        observer.observe(vec![3], 2000.0);
        assert!(observer.take_entered().is_empty());
        observer.update_scroll(1500.0);
        assert_eq!(observer.take_entered(), vec![vec![3]]);
    }

    #[test]
    fn test_margin_extends_the_band() {
        let mut observer = ViewportObserver::new(500.0).with_margin(50.0);
        observer.observe(vec![0], 549.0);
        observer.observe(vec![1], 551.0);
        assert_eq!(observer.take_entered(), vec![vec![0]]);
    }

    #[test]
    fn test_entered_targets_report_once() {
        let mut observer = ViewportObserver::new(720.0);
        observer.observe(vec![0], 0.0);
        assert_eq!(observer.take_entered().len(), 1);
        assert!(observer.take_entered().is_empty());
    }

    #[test]
    fn test_observe_deduplicates() {
        let mut observer = ViewportObserver::new(720.0);
        observer.observe(vec![0], 5000.0);
        observer.observe(vec![0], 100.0);
        assert_eq!(observer.observed_count(), 1);
        assert_eq!(observer.take_entered(), vec![vec![0]]);
    }

    #[test]
    fn test_unobserve_removes_target() {
        let mut observer = ViewportObserver::new(720.0);
        observer.observe(vec![0], 100.0);
        observer.unobserve(&[0]);
        assert!(observer.take_entered().is_empty());
    }
}
