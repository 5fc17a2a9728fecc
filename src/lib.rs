//! # ticket-scanner
//!
//! Check-in scanner client for ticketed events.
//!
//! A decoder (camera process or keyboard-wedge scanner) produces decoded QR
//! payloads. Repeat reads of a code left in frame are debounced. Every
//! accepted payload is posted to the verification endpoint and the
//! classified answer is rendered for the gate operator.
//!
//! ```text
//! Decoder ──ScanEvent──▶ ScanHandler ──POST /verify──▶ VerificationService
//!                            │
//!                            ▼
//!                     DisplayState ──▶ Renderer
//! ```

pub mod config;
pub mod debounce;
pub mod decoder;
pub mod display;
pub mod error;
pub mod event;
pub mod handler;
pub mod scanner;
pub mod stats;
pub mod verify;

pub use config::{DecoderConfig, DecoderSource, OutputFormat, ScannerConfig};
pub use debounce::Debouncer;
pub use decoder::{CommandDecoder, Decoder, LineDecoder, ScanEvent};
pub use display::{DisplayState, JsonRenderer, Renderer, StatusMode, TerminalRenderer};
pub use error::{Error, Result};
pub use event::{ScannerEvent, ScannerEventsChannel, ScannerEventsSender};
pub use handler::ScanHandler;
pub use scanner::{RunningScanner, ScannerBuilder};
pub use stats::ScanStats;
pub use verify::{CheckOutcome, HttpVerifier, VerificationResult, VerificationService, VerifyReply};
