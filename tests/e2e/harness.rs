//! Mock check-in server for E2E tests.
//!
//! Tickets are encoded in the QR as `TICKET:<id>:<event>`. The first valid
//! scan marks the ticket used; later scans answer "Already Used" with the
//! first scan time.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Error type for harness operations.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Could not bind or serve.
    #[error("mock server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// How the mock answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// Behave like the real backend.
    Normal,
    /// Sleep before answering.
    Slow(Duration),
    /// Answer 500 with an HTML body.
    Broken,
}

/// A ticket known to the mock.
#[derive(Debug, Clone)]
pub struct MockTicket {
    /// Holder name.
    pub name: String,
    /// Event name.
    pub event: String,
    /// Consumed flag.
    pub used: bool,
    /// First scan time.
    pub scanned_at: Option<String>,
}

struct MockState {
    mode: ServerMode,
    tickets: Mutex<HashMap<String, MockTicket>>,
    requests: Mutex<Vec<String>>,
}

/// A running mock server.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Start a normal server.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> Result<Self> {
        Self::start_with_mode(ServerMode::Normal).await
    }

    /// Start a server in the given mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start_with_mode(mode: ServerMode) -> Result<Self> {
        let state = Arc::new(MockState {
            mode,
            tickets: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/verify", post(verify))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        info!("Mock check-in server listening on {addr} ({mode:?})");
        Ok(Self { addr, state, task })
    }

    /// Register a ticket and return its QR payload.
    pub fn issue(&self, ticket_id: &str, name: &str, event: &str) -> String {
        self.state.tickets.lock().insert(
            ticket_id.to_string(),
            MockTicket {
                name: name.to_string(),
                event: event.to_string(),
                used: false,
                scanned_at: None,
            },
        );
        format!("TICKET:{ticket_id}:{event}")
    }

    /// Look up a ticket.
    #[must_use]
    pub fn ticket(&self, ticket_id: &str) -> Option<MockTicket> {
        self.state.tickets.lock().get(ticket_id).cloned()
    }

    /// Payloads received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().clone()
    }

    /// Base URL, without `/verify`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full `/verify` URL.
    #[must_use]
    pub fn verify_url(&self) -> String {
        format!("{}/verify", self.base_url())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn reject(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "valid": false, "message": message })),
    )
        .into_response()
}

async fn verify(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let data = body
        .get("ticket_data")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.requests.lock().push(data.clone());

    match state.mode {
        ServerMode::Normal => {}
        ServerMode::Slow(delay) => tokio::time::sleep(delay).await,
        ServerMode::Broken => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "<html><body>Internal Server Error</body></html>",
            )
                .into_response();
        }
    }

    if !data.starts_with("TICKET:") {
        return reject("Invalid QR format");
    }
    let parts: Vec<&str> = data.split(':').collect();
    if parts.len() != 3 {
        return reject("Invalid QR data");
    }
    let ticket_id = parts[1];

    let mut tickets = state.tickets.lock();
    let Some(ticket) = tickets.get_mut(ticket_id) else {
        return reject("Invalid Ticket");
    };

    if ticket.used {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "valid": false,
                "message": "Already Used",
                "name": ticket.name,
                "event": ticket.event,
                "ticket_id": ticket_id,
                "scanned_at": ticket.scanned_at,
            })),
        )
            .into_response();
    }

    ticket.used = true;
    ticket.scanned_at = Some(chrono::Utc::now().to_rfc3339());

    Json(json!({
        "valid": true,
        "message": "Valid Ticket - Welcome!",
        "name": ticket.name,
        "event": ticket.event,
        "ticket_id": ticket_id,
    }))
    .into_response()
}
