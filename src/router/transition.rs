//! Page transition indicator
//!
//! Models the progress bar shown across the top of the page during
//! navigation. The indicator moves through phases that map onto the
//! classes and transform the stylesheet animates, and the completion
//! sequence plays out on the runtime timer so navigation never waits
//! on it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

/// Durations of the completion sequence steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    /// How long the full bar stays visible after a navigation lands
    pub complete_pulse: Duration,
    /// How long the collapse back to zero width takes
    pub collapse: Duration,
    /// Settle time before the bar is reusable
    pub reset: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            complete_pulse: Duration::from_millis(300),
            collapse: Duration::from_millis(300),
            reset: Duration::from_millis(10),
        }
    }
}

/// Phase of the indicator bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Hidden, collapsed to zero width
    Idle,
    /// Animating while a navigation is in flight
    Loading,
    /// Full bar pulse after the navigation landed
    Complete,
    /// Collapsing back to zero width
    Collapsing,
}

/// Shared transition indicator
///
/// Cheap to clone; clones observe and drive the same bar.
#[derive(Debug, Clone)]
pub struct TransitionIndicator {
    phase: Arc<Mutex<TransitionPhase>>,
    spinner: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
    timings: TransitionTimings,
}

impl TransitionIndicator {
    /// Create an idle indicator with default timings
    pub fn new() -> Self {
        Self::with_timings(TransitionTimings::default())
    }

    /// Create an idle indicator with custom timings
    pub fn with_timings(timings: TransitionTimings) -> Self {
        Self {
            phase: Arc::new(Mutex::new(TransitionPhase::Idle)),
            spinner: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            timings,
        }
    }

    /// Current phase
    pub fn phase(&self) -> TransitionPhase {
        self.phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(TransitionPhase::Idle)
    }

    /// Whether the loading spinner is shown
    pub fn spinner_visible(&self) -> bool {
        self.spinner.load(Ordering::SeqCst)
    }

    /// Show the loading spinner
    pub fn show_spinner(&self) {
        self.spinner.store(true, Ordering::SeqCst);
    }

    /// Hide the loading spinner
    pub fn hide_spinner(&self) {
        self.spinner.store(false, Ordering::SeqCst);
    }

    /// Enter the loading phase, abandoning any pending completion steps
    pub fn begin_loading(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.set_phase(TransitionPhase::Loading);
    }

    /// Return to idle, abandoning any pending completion steps
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.hide_spinner();
        self.set_phase(TransitionPhase::Idle);
    }

    /// Play the landing sequence: full pulse, collapse, settle.
    ///
    /// Steps stop applying as soon as a new navigation begins.
    pub async fn play_completion(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        if !self.advance(epoch, TransitionPhase::Complete) {
            return;
        }
        sleep(self.timings.complete_pulse).await;
        if !self.advance(epoch, TransitionPhase::Collapsing) {
            return;
        }
        sleep(self.timings.collapse).await;
        sleep(self.timings.reset).await;
        self.advance(epoch, TransitionPhase::Idle);
    }

    /// Class the stylesheet keys its animation off
    pub fn css_class(&self) -> &'static str {
        match self.phase() {
            TransitionPhase::Loading => "loading",
            TransitionPhase::Complete => "complete",
            _ => "",
        }
    }

    /// Inline transform for phases the stylesheet does not animate
    pub fn transform(&self) -> &'static str {
        match self.phase() {
            TransitionPhase::Idle | TransitionPhase::Collapsing => "scaleX(0)",
            _ => "",
        }
    }

    fn set_phase(&self, phase: TransitionPhase) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase;
        }
    }

    fn advance(&self, epoch: u64, phase: TransitionPhase) -> bool {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        self.set_phase(phase);
        true
    }
}

impl Default for TransitionIndicator {
    fn default() -> Self {
        Self::new()
    }
}
