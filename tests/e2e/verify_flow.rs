//! HTTP verification against the mock check-in server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{MockServer, ServerMode};
use std::time::Duration;
use ticket_scanner::display::{StatusMode, PLACEHOLDER};
use ticket_scanner::verify::check_ticket;
use ticket_scanner::{CheckOutcome, Error, HttpVerifier, VerificationService};

fn verifier(server: &MockServer) -> HttpVerifier {
    HttpVerifier::new(server.verify_url(), Some(Duration::from_secs(5))).expect("client")
}

#[tokio::test]
async fn test_first_scan_granted_second_already_used() {
    let server = MockServer::start().await.expect("server");
    let payload = server.issue("9F3A21C0", "Alice", "Expo");
    let verifier = verifier(&server);

    let first = check_ticket(&verifier, &payload).await;
    let state = first.display();
    assert_eq!(state.mode, StatusMode::Valid);
    assert_eq!(state.name_or_placeholder(), "Alice");
    assert_eq!(state.event_or_placeholder(), "Expo");
    assert_eq!(state.ticket_or_placeholder(), "9F3A21C0");
    assert!(server.ticket("9F3A21C0").expect("ticket").used);

    let second = check_ticket(&verifier, &payload).await;
    let state = second.display();
    assert_eq!(state.mode, StatusMode::Used);
    assert_eq!(state.name_or_placeholder(), "Alice");

    let scanned_at = server
        .ticket("9F3A21C0")
        .and_then(|t| t.scanned_at)
        .expect("scan time recorded");
    assert_eq!(state.extra_or_empty(), format!("Used at: {scanned_at}"));
}

#[tokio::test]
async fn test_rejection_reply_is_parsed_on_400() {
    let server = MockServer::start().await.expect("server");
    let verifier = verifier(&server);

    let reply = verifier.verify("not a ticket").await.expect("reply");
    assert!(!reply.success);
    assert!(!reply.result.valid);
    assert_eq!(reply.result.message.as_deref(), Some("Invalid QR format"));
}

#[tokio::test]
async fn test_unknown_ticket_rejected() {
    let server = MockServer::start().await.expect("server");
    let verifier = verifier(&server);

    let outcome = check_ticket(&verifier, "TICKET:NOPE:Expo").await;
    assert_eq!(
        outcome,
        CheckOutcome::Rejected {
            message: "Invalid Ticket".to_string()
        }
    );

    let state = outcome.display();
    assert_eq!(state.mode, StatusMode::Invalid);
    assert_eq!(state.name_or_placeholder(), PLACEHOLDER);
}

#[tokio::test]
async fn test_malformed_payload_forwarded_as_is() {
    let server = MockServer::start().await.expect("server");
    let verifier = verifier(&server);

    let outcome = check_ticket(&verifier, "TICKET:A:B:C").await;
    assert_eq!(outcome.display().extra_or_empty(), "Invalid QR data");
    assert_eq!(server.requests(), vec!["TICKET:A:B:C".to_string()]);
}

#[tokio::test]
async fn test_timeout_is_unreachable() {
    let server = MockServer::start_with_mode(ServerMode::Slow(Duration::from_secs(2)))
        .await
        .expect("server");
    let payload = server.issue("T1", "Alice", "Expo");
    let verifier =
        HttpVerifier::new(server.verify_url(), Some(Duration::from_millis(100))).expect("client");

    let err = verifier.verify(&payload).await.expect_err("should time out");
    assert!(matches!(err, Error::Network(_)), "got {err}");

    let outcome = check_ticket(&verifier, &payload).await;
    assert_eq!(outcome, CheckOutcome::Unreachable);
    assert_eq!(outcome.display().extra_or_empty(), "could not reach server");
}

#[tokio::test]
async fn test_non_json_body_is_unreachable() {
    let server = MockServer::start_with_mode(ServerMode::Broken)
        .await
        .expect("server");
    let verifier = verifier(&server);

    let err = verifier.verify("TICKET:T1:Expo").await.expect_err("html body");
    assert!(matches!(err, Error::InvalidResponse(_)), "got {err}");

    let outcome = check_ticket(&verifier, "TICKET:T1:Expo").await;
    assert_eq!(outcome, CheckOutcome::Unreachable);
}
