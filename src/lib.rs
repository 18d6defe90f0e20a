//! # Licensegate
//!
//! **Domain-bound license records, verification, and script gating.**
//!
//! A license is a `(domain, token, status)` record. A page asks the public
//! verification endpoint whether its hostname is licensed for the token it
//! ships with, and only loads the gated script on a clear "yes".
//!
//! ## Features
//!
//! - **Wildcard domains**: `*.shop.com` covers `shop.com` and every subdomain
//! - **Active/inactive licenses**: disabled records never verify
//! - **Admin CRUD API**: paginated, filterable, sortable listing behind a bearer token
//! - **Persistent store**: JSON snapshot written atomically after each change
//! - **Fail-closed gating**: store outages are errors, never `valid: false` or `valid: true`
//!
//! ## Quickstart
//!
//! ```
//! use licensegate::{CreateLicense, LicenseStore, MemoryStore, VerificationService};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), licensegate::LicenseGateError> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.create(CreateLicense::new("*.shop.com", "T1"))?;
//!
//!     let service = VerificationService::new(store);
//!     assert!(service.verify("foo.shop.com", "T1")?);
//!     assert!(!service.verify("foo.shop.com", "WRONG")?);
//!     Ok(())
//! }
//! ```
//!
//! ## Domain matching
//!
//! See [`domain::matcher::matches`]. Hostnames are compared exactly as given;
//! callers normalize case, ports and trailing dots beforehand.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Matching
pub mod domain;

// Data model
pub mod protocol;

// Storage layer
pub mod store;

// Verification layer
pub mod verify;

// Client layer
pub mod client;
pub mod gate;

// HTTP boundary
pub mod server;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::{GateConfig, ServerConfig, StorageConfig};
pub use domain::matcher::matches;
pub use errors::LicenseGateError;
pub use gate::loader::{GateLoader, GateState, ScriptInjector};
pub use protocol::models::{
    CreateLicense, LicenseRecord, UpdateLicense, VerifyRequest, VerifyResponse,
};
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
pub use store::query::{ListParams, Page};
pub use store::LicenseStore;
pub use verify::service::VerificationService;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
