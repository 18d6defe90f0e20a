//! License record storage.
//!
//! [`LicenseStore`] is the seam between the HTTP/verification layers and
//! persistence. Two backends ship with the crate:
//! - [`memory::MemoryStore`] keeps the table in process memory
//! - [`file::FileStore`] also persists every mutation to a JSON snapshot

pub mod file;
pub mod memory;
pub mod query;
pub mod table;

use crate::protocol::models::{CreateLicense, LicenseRecord, UpdateLicense};
use crate::LicenseGateError;
use query::{ListParams, Page};
use std::sync::Arc;

/// Owner of the canonical license collection.
///
/// Implementations must be thread-safe: verification calls read concurrently
/// with administrative mutations.
pub trait LicenseStore: Send + Sync {
    /// Snapshot of every record with `status == true`.
    fn list_active(&self) -> Result<Vec<LicenseRecord>, LicenseGateError>;

    /// Filtered, sorted, paginated listing.
    fn list(&self, params: &ListParams) -> Result<Page<LicenseRecord>, LicenseGateError>;

    /// Fetch one record. Unknown ids are `NotFound`.
    fn get(&self, id: u64) -> Result<LicenseRecord, LicenseGateError>;

    /// Create a record; status defaults to active.
    fn create(&self, input: CreateLicense) -> Result<LicenseRecord, LicenseGateError>;

    /// Partially update a record.
    fn update(&self, id: u64, input: UpdateLicense) -> Result<LicenseRecord, LicenseGateError>;

    /// Hard-delete a record.
    fn delete(&self, id: u64) -> Result<(), LicenseGateError>;
}

impl<S: LicenseStore + ?Sized> LicenseStore for Arc<S> {
    fn list_active(&self) -> Result<Vec<LicenseRecord>, LicenseGateError> {
        (**self).list_active()
    }

    fn list(&self, params: &ListParams) -> Result<Page<LicenseRecord>, LicenseGateError> {
        (**self).list(params)
    }

    fn get(&self, id: u64) -> Result<LicenseRecord, LicenseGateError> {
        (**self).get(id)
    }

    fn create(&self, input: CreateLicense) -> Result<LicenseRecord, LicenseGateError> {
        (**self).create(input)
    }

    fn update(&self, id: u64, input: UpdateLicense) -> Result<LicenseRecord, LicenseGateError> {
        (**self).update(id, input)
    }

    fn delete(&self, id: u64) -> Result<(), LicenseGateError> {
        (**self).delete(id)
    }
}

pub(crate) fn poisoned<T>(_: T) -> LicenseGateError {
    LicenseGateError::StoreUnavailable("license table lock poisoned".to_string())
}
