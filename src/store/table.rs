//! The canonical license collection shared by every store backend.
//!
//! A table owns the records and the id counter. Backends wrap it in a lock
//! and decide where (if anywhere) it is persisted.

use crate::protocol::models::{CreateLicense, LicenseRecord, UpdateLicense};
use crate::store::query::{ListParams, Page};
use crate::LicenseGateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk snapshot version.
pub const TABLE_VERSION: u32 = 1;

/// License rows keyed by id, plus the next id to hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseTable {
    /// Snapshot format version.
    pub version: u32,

    /// Next id to assign. Only ever increases, so deleted ids stay retired.
    pub next_id: u64,

    /// Rows keyed by id.
    pub records: BTreeMap<u64, LicenseRecord>,
}

impl Default for LicenseTable {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION,
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

impl LicenseTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `status == true`.
    pub fn active(&self) -> Vec<LicenseRecord> {
        self.records
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect()
    }

    /// One page of records.
    pub fn list(&self, params: &ListParams) -> Page<LicenseRecord> {
        params.apply(self.records.values())
    }

    /// Look up a record by id.
    pub fn get(&self, id: u64) -> Result<&LicenseRecord, LicenseGateError> {
        self.records.get(&id).ok_or(LicenseGateError::NotFound { id })
    }

    /// Insert a new record. Status defaults to active.
    pub fn create(
        &mut self,
        input: CreateLicense,
        now: DateTime<Utc>,
    ) -> Result<LicenseRecord, LicenseGateError> {
        input.validate()?;

        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| LicenseGateError::StoreUnavailable("license id space exhausted".to_string()))?;

        let record = LicenseRecord {
            id,
            domain: input.domain,
            token: input.token,
            status: input.status.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// Replace the fields present in `input`.
    pub fn update(
        &mut self,
        id: u64,
        input: UpdateLicense,
        now: DateTime<Utc>,
    ) -> Result<LicenseRecord, LicenseGateError> {
        input.validate()?;

        let record = self
            .records
            .get_mut(&id)
            .ok_or(LicenseGateError::NotFound { id })?;
        record.apply(input, now);
        Ok(record.clone())
    }

    /// Remove a record for good.
    pub fn delete(&mut self, id: u64) -> Result<LicenseRecord, LicenseGateError> {
        self.records
            .remove(&id)
            .ok_or(LicenseGateError::NotFound { id })
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, LicenseGateError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            LicenseGateError::StoreUnavailable(format!("Failed to serialize licenses: {}", e))
        })
    }

    /// Parse a snapshot and check it is internally consistent.
    pub fn from_json(json: &str) -> Result<Self, LicenseGateError> {
        let table: Self = serde_json::from_str(json).map_err(|e| {
            LicenseGateError::StoreUnavailable(format!("Failed to parse licenses: {}", e))
        })?;

        if table.version != TABLE_VERSION {
            return Err(LicenseGateError::StoreUnavailable(format!(
                "Unsupported license snapshot version {}",
                table.version
            )));
        }
        if let Some((&id, record)) = table.records.iter().find(|(id, r)| r.id != **id) {
            return Err(LicenseGateError::StoreUnavailable(format!(
                "License row {} is stored under key {}",
                record.id, id
            )));
        }
        if let Some(&max_id) = table.records.keys().next_back() {
            if table.next_id <= max_id {
                return Err(LicenseGateError::StoreUnavailable(format!(
                    "next id {} would reuse existing id {}",
                    table.next_id, max_id
                )));
            }
        }
        Ok(table)
    }
}
