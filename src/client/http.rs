//! Reqwest-based HTTP client for the verification endpoint.
//!
//! Used by the gate loader and by anything else that needs to ask a running
//! licensegate server whether a domain is licensed.

use crate::config::GateConfig;
use crate::protocol::models::{parse_verify_response, VerifyRequest, VerifyResponse};
use crate::LicenseGateError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Verification endpoint client.
pub struct VerifyClient {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl VerifyClient {
    /// Create a client for the endpoint named in `config`.
    pub fn new(config: &GateConfig) -> Result<Self, LicenseGateError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| LicenseGateError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            user_agent: build_user_agent(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set request timeout.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, LicenseGateError> {
        self.timeout = timeout;
        self.client = Client::builder().timeout(timeout).build().map_err(|e| {
            LicenseGateError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(self)
    }

    /// Ask the endpoint whether `domain` is licensed for `token`.
    ///
    /// # Errors
    /// - `Transport` on connection failures and non-2xx statuses
    /// - `ProtocolError` when the body is not `{"valid": bool}`
    pub fn verify(&self, domain: &str, token: &str) -> Result<VerifyResponse, LicenseGateError> {
        let request = VerifyRequest {
            domain: domain.to_string(),
            token: token.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .map_err(|e| LicenseGateError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LicenseGateError::Transport(format!(
                "Verification endpoint returned {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| LicenseGateError::Transport(format!("Failed to read body: {}", e)))?;
        parse_verify_response(&body)
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Build the User-Agent string: `licensegate-loader/<version>`.
pub fn build_user_agent() -> String {
    format!("licensegate-loader/{}", env!("CARGO_PKG_VERSION"))
}
