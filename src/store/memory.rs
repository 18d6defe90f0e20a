//! In-memory license store.

use crate::clock::{Clock, SystemClock};
use crate::protocol::models::{CreateLicense, LicenseRecord, UpdateLicense};
use crate::store::query::{ListParams, Page};
use crate::store::table::LicenseTable;
use crate::store::{poisoned, LicenseStore};
use crate::LicenseGateError;
use std::sync::{Arc, RwLock};
use tracing::info;

/// License store held entirely in process memory.
///
/// Suitable for tests and single-process deployments that seed their
/// licenses at startup. Nothing survives a restart.
pub struct MemoryStore {
    table: RwLock<LicenseTable>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(LicenseTable::new()),
            clock,
        }
    }

    /// Create a store pre-filled with `licenses`.
    pub fn seeded<I>(licenses: I) -> Result<Self, LicenseGateError>
    where
        I: IntoIterator<Item = CreateLicense>,
    {
        let store = Self::new();
        for license in licenses {
            store.create(license)?;
        }
        Ok(store)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseStore for MemoryStore {
    fn list_active(&self) -> Result<Vec<LicenseRecord>, LicenseGateError> {
        Ok(self.table.read().map_err(poisoned)?.active())
    }

    fn list(&self, params: &ListParams) -> Result<Page<LicenseRecord>, LicenseGateError> {
        Ok(self.table.read().map_err(poisoned)?.list(params))
    }

    fn get(&self, id: u64) -> Result<LicenseRecord, LicenseGateError> {
        self.table.read().map_err(poisoned)?.get(id).cloned()
    }

    fn create(&self, input: CreateLicense) -> Result<LicenseRecord, LicenseGateError> {
        let record = self
            .table
            .write()
            .map_err(poisoned)?
            .create(input, self.clock.now_utc())?;
        info!(id = record.id, domain = %record.domain, "license created");
        Ok(record)
    }

    fn update(&self, id: u64, input: UpdateLicense) -> Result<LicenseRecord, LicenseGateError> {
        let record = self
            .table
            .write()
            .map_err(poisoned)?
            .update(id, input, self.clock.now_utc())?;
        info!(id, domain = %record.domain, status = record.status, "license updated");
        Ok(record)
    }

    fn delete(&self, id: u64) -> Result<(), LicenseGateError> {
        self.table.write().map_err(poisoned)?.delete(id)?;
        info!(id, "license deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::Duration;

    #[test]
    fn test_lifecycle_with_mock_clock() {
        let clock = Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z"));
        let store = MemoryStore::with_clock(clock.clone());

        let created = store.create(CreateLicense::new("shop.com", "T1")).unwrap();
        assert_eq!(created.created_at.to_rfc3339(), "2025-01-15T12:00:00+00:00");

        clock.advance(Duration::hours(2));
        let updated = store
            .update(
                created.id,
                UpdateLicense {
                    token: Some("T2".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at.to_rfc3339(), "2025-01-15T14:00:00+00:00");
        assert_eq!(store.get(created.id).unwrap().token, "T2");

        store.delete(created.id).unwrap();
        assert!(matches!(
            store.get(created.id),
            Err(LicenseGateError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(created.id),
            Err(LicenseGateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_active_and_list() {
        let store = MemoryStore::seeded([
            CreateLicense::new("a.com", "X"),
            CreateLicense::new("b.com", "Y").with_status(false),
            CreateLicense::new("*.a.com", "Z"),
        ])
        .unwrap();

        let active = store.list_active().unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.status));

        let page = store.list(&ListParams::default()).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data[0].domain, "*.a.com");
    }

    #[test]
    fn test_arc_store_delegates() {
        let store: Arc<dyn LicenseStore> = Arc::new(MemoryStore::new());
        let created = store.create(CreateLicense::new("a.com", "X")).unwrap();
        assert_eq!(store.get(created.id).unwrap(), created);
    }
}
