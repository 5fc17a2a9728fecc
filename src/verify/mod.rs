//! Ticket verification against the check-in server.
//!
//! Every accepted scan is posted to the server and the reply is classified
//! into one of five outcomes:
//!
//! ```text
//! reply received? ──no──▶ Unreachable
//!       │
//!      yes
//!       │
//! 2xx && valid ──yes──▶ Granted
//!       │
//!       no
//!       │
//! message (default "Invalid ticket"), lowercased
//!   contains "already" ──▶ AlreadyUsed
//!   contains "invalid" ──▶ Rejected
//!   otherwise          ──▶ Failed
//! ```
//!
//! Matching is by substring on the server's English wording.

mod http;

pub use http::HttpVerifier;

use crate::display::{DisplayState, StatusMode, NOTE_RECORDED, NOTE_UNREACHABLE};
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use tracing::{debug, error};

/// Message assumed when a rejection carries none.
pub const DEFAULT_MESSAGE: &str = "Invalid ticket";

/// Request body for `POST /verify`.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    /// Decoded QR payload, forwarded as-is.
    pub ticket_data: &'a str,
}

/// Response body of `POST /verify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether entry is granted. Missing or null reads as `false`.
    #[serde(default, deserialize_with = "null_as_false")]
    pub valid: bool,
    /// Ticket holder name.
    #[serde(default)]
    pub name: Option<String>,
    /// Event name.
    #[serde(default)]
    pub event: Option<String>,
    /// Ticket identifier.
    #[serde(default)]
    pub ticket_id: Option<String>,
    /// When the ticket was first used.
    #[serde(default)]
    pub scanned_at: Option<String>,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or_default())
}

/// A reply from the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReply {
    /// The HTTP status was 2xx.
    pub success: bool,
    /// Parsed body.
    pub result: VerificationResult,
}

/// Remote service that validates a payload and marks the ticket consumed.
pub trait VerificationService: Send + Sync + 'static {
    /// Submit a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed or the reply
    /// could not be parsed. A rejection is an `Ok` reply.
    fn verify(&self, ticket_data: &str) -> impl Future<Output = Result<VerifyReply>> + Send;
}

/// Classified result of one verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Entry granted; the server recorded the ticket as used.
    Granted {
        /// Ticket holder name.
        name: Option<String>,
        /// Event name.
        event: Option<String>,
        /// Ticket identifier.
        ticket_id: Option<String>,
    },
    /// Ticket was consumed earlier.
    AlreadyUsed {
        /// Ticket holder name.
        name: Option<String>,
        /// Event name.
        event: Option<String>,
        /// Ticket identifier.
        ticket_id: Option<String>,
        /// When it was first used.
        scanned_at: Option<String>,
        /// Server message.
        message: String,
    },
    /// Server rejected the ticket.
    Rejected {
        /// Server message.
        message: String,
    },
    /// Any other refusal.
    Failed {
        /// Server message.
        message: String,
    },
    /// No usable reply.
    Unreachable,
}

impl CheckOutcome {
    /// Classify a server reply.
    #[must_use]
    pub fn classify(reply: VerifyReply) -> Self {
        let VerifyReply { success, result } = reply;

        if success && result.valid {
            return Self::Granted {
                name: result.name,
                event: result.event,
                ticket_id: result.ticket_id,
            };
        }

        let message = result
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
        let lowered = message.to_lowercase();

        if lowered.contains("already") {
            Self::AlreadyUsed {
                name: result.name,
                event: result.event,
                ticket_id: result.ticket_id,
                scanned_at: result.scanned_at.filter(|s| !s.is_empty()),
                message,
            }
        } else if lowered.contains("invalid") {
            Self::Rejected { message }
        } else {
            Self::Failed { message }
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Granted { .. } => "granted",
            Self::AlreadyUsed { .. } => "already_used",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
            Self::Unreachable => "unreachable",
        }
    }

    /// The state to show for this outcome.
    #[must_use]
    pub fn display(&self) -> DisplayState {
        match self {
            Self::Granted {
                name,
                event,
                ticket_id,
            } => DisplayState::new(
                StatusMode::Valid,
                "Valid Ticket - Entry Granted",
                name.clone(),
                event.clone(),
                ticket_id.clone(),
                Some(NOTE_RECORDED.to_string()),
            ),
            Self::AlreadyUsed {
                name,
                event,
                ticket_id,
                scanned_at,
                message,
            } => {
                let extra = scanned_at
                    .as_ref()
                    .map_or_else(|| message.clone(), |at| format!("Used at: {at}"));
                DisplayState::new(
                    StatusMode::Used,
                    "Already Used Ticket",
                    name.clone(),
                    event.clone(),
                    ticket_id.clone(),
                    Some(extra),
                )
            }
            Self::Rejected { message } => DisplayState::new(
                StatusMode::Invalid,
                "Invalid Ticket",
                None,
                None,
                None,
                Some(message.clone()),
            ),
            Self::Failed { message } => DisplayState::new(
                StatusMode::Invalid,
                "Error",
                None,
                None,
                None,
                Some(message.clone()),
            ),
            Self::Unreachable => DisplayState::new(
                StatusMode::Invalid,
                "Network error",
                None,
                None,
                None,
                Some(NOTE_UNREACHABLE.to_string()),
            ),
        }
    }
}

/// Verify one payload and classify the answer.
///
/// Never fails: transport and parse errors are logged and become
/// [`CheckOutcome::Unreachable`].
pub async fn check_ticket<V: VerificationService>(service: &V, ticket_data: &str) -> CheckOutcome {
    match service.verify(ticket_data).await {
        Ok(reply) => {
            let outcome = CheckOutcome::classify(reply);
            debug!("Verification finished: {}", outcome.kind());
            outcome
        }
        Err(e) => {
            error!("Verification request failed: {e}");
            CheckOutcome::Unreachable
        }
    }
}
