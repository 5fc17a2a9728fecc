//! End-to-end tests against a mock check-in server.
//!
//! The mock serves `POST /verify` with the same contract as the real
//! backend. Tests drive it through `HttpVerifier` and through whole
//! scanning sessions.

mod harness;
mod session;
mod verify_flow;

pub use harness::{MockServer, ServerMode};
