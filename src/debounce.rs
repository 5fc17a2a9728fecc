//! Repeat-read suppression.
//!
//! A QR code left in front of the camera is decoded several times per
//! second. Only the first read of a given payload inside the window is
//! accepted; any different payload always passes.

use std::time::{Duration, Instant};

/// Default debounce window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1500);

/// Last accepted scan. Both fields are absent until the first accept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebounceState {
    /// Text of the last accepted scan.
    pub last_text: Option<String>,
    /// When the last accepted scan was observed.
    pub last_time: Option<Instant>,
}

/// Debounce filter owned by a single scan handler.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    /// Create a debouncer with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::default(),
        }
    }

    /// Decide whether a scan should be processed.
    ///
    /// Returns `false` when `text` equals the last accepted text and fewer
    /// than `window` have elapsed since it was observed. On `true` the scan
    /// becomes the new baseline.
    pub fn accept(&mut self, text: &str, observed_at: Instant) -> bool {
        if let (Some(last_text), Some(last_time)) = (&self.state.last_text, self.state.last_time) {
            // Out-of-order timestamps count as zero elapsed.
            let elapsed = observed_at.saturating_duration_since(last_time);
            if last_text == text && elapsed < self.window {
                return false;
            }
        }

        self.state.last_text = Some(text.to_owned());
        self.state.last_time = Some(observed_at);
        true
    }

    /// Current baseline.
    #[must_use]
    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// The configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
