//! License verification: does an active license cover this domain/token pair?

use crate::domain::matcher::matches;
use crate::protocol::models::LicenseRecord;
use crate::store::LicenseStore;
use crate::LicenseGateError;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Answers verification requests against a [`LicenseStore`].
///
/// Holds no state of its own. Every call reads a fresh snapshot of the active
/// licenses, so results are never cached and concurrent calls do not
/// coordinate.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn LicenseStore>,
}

impl VerificationService {
    /// Create a service reading from `store`.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self { store }
    }

    /// Verify that an active license matches `domain` and carries `token`.
    ///
    /// # Errors
    /// `StoreUnavailable` when the active set cannot be read. A failed read
    /// is never reported as `false`.
    pub fn verify(&self, domain: &str, token: &str) -> Result<bool, LicenseGateError> {
        let active = self.store.list_active()?;
        let valid = any_match(&active, domain, token);

        debug!(
            domain,
            token = %token_fingerprint(token),
            candidates = active.len(),
            valid,
            "license verification"
        );

        Ok(valid)
    }

    /// The store this service reads from.
    pub fn store(&self) -> &Arc<dyn LicenseStore> {
        &self.store
    }
}

/// Whether any record matches `domain` and has exactly `token`.
///
/// Disabled records never match, whatever slice is passed in.
pub fn any_match(records: &[LicenseRecord], domain: &str, token: &str) -> bool {
    records
        .iter()
        .any(|r| r.is_active() && r.token == token && matches(&r.domain, domain))
}

/// Short SHA-256 fingerprint of a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let hash = Sha256::digest(token.as_bytes());
    hex::encode(&hash[..6])
}
