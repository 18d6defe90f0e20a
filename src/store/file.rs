//! File-backed license store with atomic snapshot writes.
//!
//! The whole table is kept in memory and written to
//! `<data dir>/licenses.json` after every mutation. Writes go to a temp file
//! first and are renamed into place, so a crash never leaves a torn file.

use crate::clock::{Clock, SystemClock};
use crate::protocol::models::{CreateLicense, LicenseRecord, UpdateLicense};
use crate::store::query::{ListParams, Page};
use crate::store::table::LicenseTable;
use crate::store::{poisoned, LicenseStore};
use crate::LicenseGateError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "licenses.json";

/// License store persisted as a JSON snapshot.
pub struct FileStore {
    path: PathBuf,
    table: RwLock<LicenseTable>,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Open the store under `dirs::data_dir()/<namespace>/`.
    pub fn in_data_dir(namespace: &str) -> Result<Self, LicenseGateError> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            LicenseGateError::StoreUnavailable("Could not find data directory".to_string())
        })?;
        Self::open(base_dir.join(namespace))
    }

    /// Open (or create) the store in `dir` using the system clock.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LicenseGateError> {
        Self::open_with_clock(dir, Arc::new(SystemClock))
    }

    /// Open (or create) the store in `dir` with a custom clock.
    pub fn open_with_clock(
        dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LicenseGateError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LicenseGateError::StoreUnavailable(format!("Failed to create data dir: {}", e))
        })?;

        let path = dir.join(SNAPSHOT_FILE);
        let table = load_snapshot(&path)?;
        info!(path = %path.display(), records = table.len(), "license store opened");

        Ok(Self {
            path,
            table: RwLock::new(table),
            clock,
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the table and persist the result.
    ///
    /// The snapshot is written while the write lock is held, so concurrent
    /// mutations reach disk in the same order they were applied. If the write
    /// fails the in-memory table is rolled back.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut LicenseTable) -> Result<T, LicenseGateError>,
    ) -> Result<T, LicenseGateError> {
        let mut table = self.table.write().map_err(poisoned)?;
        let before = table.clone();

        let out = op(&mut table)?;
        if let Err(e) = save_snapshot(&self.path, &table) {
            *table = before;
            return Err(e);
        }
        Ok(out)
    }
}

fn load_snapshot(path: &Path) -> Result<LicenseTable, LicenseGateError> {
    if !path.exists() {
        debug!(path = %path.display(), "no license snapshot yet, starting empty");
        return Ok(LicenseTable::new());
    }

    let json = fs::read_to_string(path).map_err(|e| {
        LicenseGateError::StoreUnavailable(format!("Failed to read license snapshot: {}", e))
    })?;
    LicenseTable::from_json(&json)
}

fn save_snapshot(path: &Path, table: &LicenseTable) -> Result<(), LicenseGateError> {
    let temp_path = path.with_extension("json.tmp");
    let json = table.to_json()?;

    fs::write(&temp_path, &json).map_err(|e| {
        LicenseGateError::StoreUnavailable(format!("Failed to write temp file: {}", e))
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        LicenseGateError::StoreUnavailable(format!("Failed to rename snapshot: {}", e))
    })?;

    Ok(())
}

impl LicenseStore for FileStore {
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
        let now = self.clock.now_utc();
        let record = self.mutate(|table| table.create(input, now))?;
        info!(id = record.id, domain = %record.domain, "license created");
        Ok(record)
    }

    fn update(&self, id: u64, input: UpdateLicense) -> Result<LicenseRecord, LicenseGateError> {
        let now = self.clock.now_utc();
        let record = self.mutate(|table| table.update(id, input, now))?;
        info!(id, domain = %record.domain, status = record.status, "license updated");
        Ok(record)
    }

    fn delete(&self, id: u64) -> Result<(), LicenseGateError> {
        self.mutate(|table| table.delete(id))?;
        info!(id, "license deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert!(store.list_active().unwrap().is_empty());
        // Nothing is written until the first mutation.
        assert!(!store.path().exists());
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let created = {
            let store = FileStore::open(temp_dir.path()).unwrap();
            let created = store.create(CreateLicense::new("*.shop.com", "T1")).unwrap();
            store
                .create(CreateLicense::new("old.com", "T0").with_status(false))
                .unwrap();
            created
        };

        let reopened = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.get(created.id).unwrap(), created);
        assert_eq!(reopened.list_active().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_not_reused_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileStore::open(temp_dir.path()).unwrap();
            let a = store.create(CreateLicense::new("a.com", "X")).unwrap();
            let b = store.create(CreateLicense::new("b.com", "Y")).unwrap();
            store.delete(a.id).unwrap();
            store.delete(b.id).unwrap();
        }

        let reopened = FileStore::open(temp_dir.path()).unwrap();
        let c = reopened.create(CreateLicense::new("c.com", "Z")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        store.create(CreateLicense::new("a.com", "X")).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn test_failed_mutation_does_not_persist() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        store.create(CreateLicense::new("a.com", "X")).unwrap();

        let result = store.update(99, UpdateLicense::default());
        assert!(matches!(result, Err(LicenseGateError::NotFound { id: 99 })));

        let reopened = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.list(&ListParams::default()).unwrap().total, 1);
    }

    #[test]
    fn test_failed_write_rolls_back_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let kept = store.create(CreateLicense::new("a.com", "X")).unwrap();

        // A directory where the temp file goes makes every write fail.
        fs::create_dir(temp_dir.path().join("licenses.json.tmp")).unwrap();

        let result = store.create(CreateLicense::new("b.com", "Y"));
        assert!(matches!(result, Err(LicenseGateError::StoreUnavailable(_))));
        assert_eq!(store.list(&ListParams::default()).unwrap().total, 1);

        let result = store.delete(kept.id);
        assert!(matches!(result, Err(LicenseGateError::StoreUnavailable(_))));
        assert_eq!(store.get(kept.id).unwrap(), kept);

        // The id counter rolled back with the table.
        fs::remove_dir(temp_dir.path().join("licenses.json.tmp")).unwrap();
        let next = store.create(CreateLicense::new("b.com", "Y")).unwrap();
        assert_eq!(next.id, kept.id + 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_store_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SNAPSHOT_FILE), "{ not json").unwrap();

        let result = FileStore::open(temp_dir.path());
        assert!(matches!(result, Err(LicenseGateError::StoreUnavailable(_))));
    }
}
