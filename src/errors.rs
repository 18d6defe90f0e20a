//! Licensegate error types.

use thiserror::Error;

/// Errors produced by the license store, verification and gating layers.
#[derive(Debug, Error)]
pub enum LicenseGateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request input failed boundary validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No license record exists for the given id.
    #[error("License with ID {id} not found")]
    NotFound {
        /// The id that was looked up.
        id: u64,
    },

    /// The persistence layer could not be read or written.
    #[error("License store unavailable: {0}")]
    StoreUnavailable(String),

    /// Missing or wrong administrative bearer credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// HTTP transport error talking to the verification endpoint.
    #[error("Verification transport error: {0}")]
    Transport(String),

    /// The verification endpoint answered with something we could not use.
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

impl LicenseGateError {
    /// Build a `Validation` error for an empty required field.
    pub fn empty_field(field: &str) -> Self {
        Self::Validation(format!("{} should not be empty", field))
    }
}
