//! HTTP client for the `/verify` endpoint.

use crate::config::ScannerConfig;
use crate::error::{Error, Result};
use crate::verify::{VerificationResult, VerificationService, VerifyReply, VerifyRequest};
use std::time::Duration;
use tracing::{debug, info};

/// Verifies tickets with `POST {server}/verify`.
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpVerifier {
    /// Create a verifier for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("ticket-scanner/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        let url = url.into();
        info!("Verifying tickets against {url} (timeout={timeout:?})");
        Ok(Self { client, url })
    }

    /// Create a verifier from the scanner configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        Self::new(config.verify_url(), config.request_timeout())
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl VerificationService for HttpVerifier {
    async fn verify(&self, ticket_data: &str) -> Result<VerifyReply> {
        let response = self
            .client
            .post(&self.url)
            .json(&VerifyRequest { ticket_data })
            .send()
            .await?;

        // Rejections arrive as 400 with a JSON body, so the body is read on
        // every status.
        let status = response.status();
        let result: VerificationResult = response.json().await?;
        debug!("Verify replied {status}: valid={}", result.valid);

        Ok(VerifyReply {
            success: status.is_success(),
            result,
        })
    }
}
