//! Scan handling: debounce, verify, render.

use crate::debounce::Debouncer;
use crate::display::{DisplayState, Renderer};
use crate::event::{ScannerEvent, ScannerEventsSender};
use crate::stats::StatsTracker;
use crate::verify::{check_ticket, CheckOutcome, VerificationService};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Drives the scan -> verify -> render cycle for one session.
///
/// Each accepted scan gets a sequence number. A finished verification is
/// rendered only while its scan is still the latest accepted one, so a slow
/// reply for an earlier ticket never overwrites a newer result. Superseded
/// requests are left to finish; their outcome is dropped.
pub struct ScanHandler<V> {
    debouncer: Debouncer,
    verifier: Arc<V>,
    surface: Arc<Surface>,
    events_tx: ScannerEventsSender,
    stats: StatsTracker,
}

/// Renderer plus the sequence number of the latest accepted scan. Both are
/// only touched under the lock, which orders "checking" against outcomes.
struct Surface {
    renderer: Arc<dyn Renderer>,
    latest: Mutex<u64>,
}

impl Surface {
    fn start(&self, state: &DisplayState) -> u64 {
        let mut latest = self.latest.lock();
        *latest += 1;
        self.renderer.render(state);
        *latest
    }

    fn finish(&self, seq: u64, state: &DisplayState) -> bool {
        let latest = self.latest.lock();
        if *latest != seq {
            return false;
        }
        self.renderer.render(state);
        true
    }
}

impl<V: VerificationService> ScanHandler<V> {
    /// Create a handler.
    #[must_use]
    pub fn new(
        verifier: Arc<V>,
        renderer: Arc<dyn Renderer>,
        debounce_window: Duration,
        events_tx: ScannerEventsSender,
        stats: StatsTracker,
    ) -> Self {
        Self {
            debouncer: Debouncer::new(debounce_window),
            verifier,
            surface: Arc::new(Surface {
                renderer,
                latest: Mutex::new(0),
            }),
            events_tx,
            stats,
        }
    }

    /// Handle one decoded payload.
    ///
    /// Returns `None` when the scan is a repeat inside the debounce window.
    /// Otherwise renders the checking state and returns the handle of the
    /// spawned verification. Must be called inside a Tokio runtime.
    pub fn on_scan(&mut self, text: &str, observed_at: Instant) -> Option<JoinHandle<CheckOutcome>> {
        if !self.debouncer.accept(text, observed_at) {
            debug!("Ignoring repeat scan inside debounce window");
            self.stats.debounced();
            let _ = self.events_tx.send(ScannerEvent::ScanDebounced {
                text: text.to_owned(),
            });
            return None;
        }

        let checking = DisplayState::checking();
        let seq = self.surface.start(&checking);
        self.stats.accepted();
        info!(seq, "Checking scanned ticket");
        let _ = self.events_tx.send(ScannerEvent::ScanAccepted {
            seq,
            text: text.to_owned(),
        });
        let _ = self.events_tx.send(ScannerEvent::Rendered {
            seq,
            state: checking,
        });

        let verifier = Arc::clone(&self.verifier);
        let surface = Arc::clone(&self.surface);
        let events_tx = self.events_tx.clone();
        let stats = self.stats.clone();
        let text = text.to_owned();

        Some(tokio::spawn(async move {
            let outcome = check_ticket(&*verifier, &text).await;
            stats.outcome(&outcome);

            let state = outcome.display();
            if surface.finish(seq, &state) {
                info!(seq, outcome = outcome.kind(), "Scan result shown");
                let _ = events_tx.send(ScannerEvent::Rendered { seq, state });
            } else {
                debug!(seq, outcome = outcome.kind(), "Dropping result of superseded scan");
                stats.superseded();
                let _ = events_tx.send(ScannerEvent::Superseded { seq });
            }

            outcome
        }))
    }

    /// Verify a payload without debouncing or rendering.
    pub async fn verify(&self, text: &str) -> CheckOutcome {
        check_ticket(&*self.verifier, text).await
    }

    /// Render a state outside the scan cycle, e.g. a decoder failure.
    pub fn show(&self, state: &DisplayState) {
        let seq = self.surface.start(state);
        let _ = self.events_tx.send(ScannerEvent::Rendered {
            seq,
            state: state.clone(),
        });
    }

    /// Session counters.
    #[must_use]
    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }
}
