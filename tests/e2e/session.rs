//! Full scanning sessions fed from line input.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::MockServer;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use ticket_scanner::display::StatusMode;
use ticket_scanner::{
    DisplayState, HttpVerifier, LineDecoder, Renderer, ScannerBuilder, ScannerConfig,
    ScannerEvent,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<DisplayState>>);

impl Renderer for Recorder {
    fn render(&self, state: &DisplayState) {
        self.0.lock().push(state.clone());
    }
}

impl Recorder {
    fn last(&self) -> DisplayState {
        self.0.lock().last().cloned().expect("rendered")
    }
}

fn config(server: &MockServer) -> ScannerConfig {
    ScannerConfig {
        server_url: server.base_url(),
        ..Default::default()
    }
}

fn leak(input: String) -> &'static [u8] {
    Box::leak(input.into_bytes().into_boxed_slice())
}

#[tokio::test]
async fn test_repeat_reads_hit_server_once() {
    let server = MockServer::start().await.expect("server");
    let ticket = server.issue("A1", "Alice", "Expo");
    let config = config(&server);
    let verifier = HttpVerifier::from_config(&config).expect("client");

    let recorder = Arc::new(Recorder::default());
    let mut scanner = ScannerBuilder::new(config, verifier)
        .renderer(recorder.clone())
        .build();

    // A code held in front of the camera is read several times in a row.
    let input = leak(format!("{ticket}\n{ticket}\n{ticket}\n"));
    let stats = scanner.run(LineDecoder::new(input)).await.expect("run");

    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.debounced, 2);
    assert_eq!(stats.granted, 1);
    assert_eq!(server.requests().len(), 1);

    let last = recorder.last();
    assert_eq!(last.mode, StatusMode::Valid);
    assert_eq!(last.extra_or_empty(), "recorded as used");
}

#[tokio::test]
async fn test_rescan_after_window_reports_already_used() {
    let server = MockServer::start().await.expect("server");
    let ticket = server.issue("A1", "Alice", "Expo");
    let config = ScannerConfig {
        debounce_ms: 0,
        ..config(&server)
    };
    let verifier = HttpVerifier::from_config(&config).expect("client");

    let recorder = Arc::new(Recorder::default());
    let mut scanner = ScannerBuilder::new(config, verifier)
        .renderer(recorder.clone())
        .build();
    let mut events = scanner.events().expect("events");

    let input = leak(format!("{ticket}\n"));
    scanner.run(LineDecoder::new(input)).await.expect("first session");
    assert_eq!(recorder.last().mode, StatusMode::Valid);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let input = leak(format!("{ticket}\n"));
    let stats = scanner.run(LineDecoder::new(input)).await.expect("second session");

    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.already_used, 1);
    let last = recorder.last();
    assert_eq!(last.mode, StatusMode::Used);
    assert!(last.extra_or_empty().starts_with("Used at: "));

    let mut started = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ScannerEvent::Started) {
            started += 1;
        }
    }
    assert_eq!(started, 2);
}

#[tokio::test]
async fn test_latest_scan_owns_the_display() {
    let server = MockServer::start().await.expect("server");
    let first = server.issue("A1", "Alice", "Expo");
    let second = server.issue("B2", "Bob", "Expo");
    let config = config(&server);
    let verifier = HttpVerifier::from_config(&config).expect("client");

    let recorder = Arc::new(Recorder::default());
    let mut scanner = ScannerBuilder::new(config, verifier)
        .renderer(recorder.clone())
        .build();

    let input = leak(format!("{first}\n{second}\n"));
    let stats = scanner.run(LineDecoder::new(input)).await.expect("run");

    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.granted, 2);
    assert!(server.ticket("A1").expect("A1").used);
    assert!(server.ticket("B2").expect("B2").used);

    let last = recorder.last();
    assert_eq!(last.name.as_deref(), Some("Bob"));
}
