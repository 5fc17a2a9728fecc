//! Scanning session: wires a decoder to the scan handler.

use crate::config::{OutputFormat, ScannerConfig};
use crate::decoder::Decoder;
use crate::display::{DisplayState, JsonRenderer, Renderer, TerminalRenderer};
use crate::error::{Error, Result};
use crate::event::{create_event_channel, ScannerEvent, ScannerEventsChannel, ScannerEventsSender};
use crate::handler::ScanHandler;
use crate::stats::{ScanStats, StatsTracker};
use crate::verify::{CheckOutcome, VerificationService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Drain limit when verification requests have no timeout.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for a scanning session.
pub struct ScannerBuilder<V> {
    config: ScannerConfig,
    verifier: V,
    renderer: Option<Arc<dyn Renderer>>,
    drain_timeout: Option<Duration>,
}

impl<V: VerificationService> ScannerBuilder<V> {
    /// Create a builder with the given configuration and verifier.
    #[must_use]
    pub fn new(config: ScannerConfig, verifier: V) -> Self {
        Self {
            config,
            verifier,
            renderer: None,
            drain_timeout: None,
        }
    }

    /// Use a specific renderer instead of the one chosen by
    /// `config.output`.
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// How long to wait for in-flight verifications once the session stops.
    ///
    /// Defaults to the request timeout plus one second, or 10 s when
    /// requests have no timeout.
    #[must_use]
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    /// Build the session.
    #[must_use]
    pub fn build(self) -> RunningScanner<V> {
        info!("Building ticket scanner with config: {:?}", self.config);

        let renderer: Arc<dyn Renderer> = match self.renderer {
            Some(renderer) => renderer,
            None => match self.config.output {
                OutputFormat::Text => Arc::new(TerminalRenderer::stdout()),
                OutputFormat::Json => Arc::new(JsonRenderer::stdout()),
            },
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = create_event_channel();
        let stats = StatsTracker::new();
        let drain_timeout = self.drain_timeout.unwrap_or_else(|| {
            self.config
                .request_timeout()
                .map_or(DEFAULT_DRAIN_TIMEOUT, |t| t + Duration::from_secs(1))
        });

        let handler = ScanHandler::new(
            Arc::new(self.verifier),
            renderer,
            self.config.debounce_window(),
            events_tx.clone(),
            stats.clone(),
        );

        RunningScanner {
            config: self.config,
            handler,
            shutdown_tx,
            shutdown_rx,
            events_tx,
            events_rx: Some(events_rx),
            stats,
            drain_timeout,
        }
    }
}

/// A scanning session.
pub struct RunningScanner<V> {
    config: ScannerConfig,
    handler: ScanHandler<V>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    events_tx: ScannerEventsSender,
    events_rx: Option<ScannerEventsChannel>,
    stats: StatsTracker,
    drain_timeout: Duration,
}

impl<V: VerificationService> RunningScanner<V> {
    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Get a receiver for scanner events.
    ///
    /// Note: Can only be called once. Subsequent calls return None.
    pub fn events(&mut self) -> Option<ScannerEventsChannel> {
        self.events_rx.take()
    }

    /// Subscribe to scanner events.
    #[must_use]
    pub fn subscribe_events(&self) -> ScannerEventsChannel {
        self.events_tx.subscribe()
    }

    /// A sender that stops the session when `true` is sent.
    #[must_use]
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.stats.snapshot()
    }

    /// Start `decoder` and process scans until the decoder stream ends or
    /// shutdown is requested. Verifications still in flight are awaited for
    /// up to the drain timeout, or until a second Ctrl-C, then aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] if the decoder cannot start, and
    /// the decoder's error if it dies mid-session. The camera failure state
    /// is rendered first.
    pub async fn run<D: Decoder>(&mut self, decoder: D) -> Result<ScanStats> {
        info!("Starting ticket scanner");
        self.handler.show(&DisplayState::ready());

        let mut scans = match decoder.start() {
            Ok(scans) => scans,
            Err(e) => {
                self.camera_failed(&e);
                return Err(e);
            }
        };

        let _ = self.events_tx.send(ScannerEvent::Started);
        info!("Scanner running, waiting for tickets");

        let mut pending: Vec<JoinHandle<CheckOutcome>> = Vec::new();
        let mut failure = None;

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    self.shutdown();
                    break;
                }
                scan = scans.recv() => match scan {
                    Some(Ok(event)) => {
                        pending.retain(|task| !task.is_finished());
                        if let Some(task) = self.handler.on_scan(&event.text, event.observed_at) {
                            pending.push(task);
                        }
                    }
                    Some(Err(e)) => {
                        self.camera_failed(&e);
                        failure = Some(e);
                        break;
                    }
                    None => {
                        info!("Decoder stream ended");
                        break;
                    }
                },
            }
        }

        self.drain(pending).await;

        let _ = self.events_tx.send(ScannerEvent::ShuttingDown);
        let stats = self.stats.snapshot();
        info!(
            "Scanner stopped: {} accepted, {} granted, {} already used, {} rejected, {} errors, {} unreachable",
            stats.accepted,
            stats.granted,
            stats.already_used,
            stats.rejected,
            stats.failed,
            stats.unreachable
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Request the session to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn drain(&self, pending: Vec<JoinHandle<CheckOutcome>>) {
        let aborts: Vec<_> = pending.iter().map(JoinHandle::abort_handle).collect();

        let drained = tokio::select! {
            results = tokio::time::timeout(self.drain_timeout, futures::future::join_all(pending)) => results.ok(),
            _ = tokio::signal::ctrl_c() => {
                info!("Second Ctrl-C received, abandoning pending verifications");
                None
            }
        };

        match drained {
            Some(results) => {
                for result in results {
                    if let Err(e) = result {
                        warn!("Verification task failed: {e}");
                    }
                }
            }
            None => {
                let unfinished = aborts.iter().filter(|task| !task.is_finished()).count();
                warn!("Aborting {unfinished} unfinished verifications");
                for task in &aborts {
                    task.abort();
                }
            }
        }
    }

    fn camera_failed(&self, e: &Error) {
        error!("Camera decoder failed: {e}");
        self.handler.show(&DisplayState::camera_unavailable());
        let _ = self.events_tx.send(ScannerEvent::DecoderFailed {
            message: e.to_string(),
        });
    }
}
