/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Key-value persistence for cached server responses, favorites and view
//! settings.
//!
//! Everything persisted by the application goes through [`LocalStore`]:
//! string keys, string values, namespaced by prefix (`data-`, `favs-`,
//! `settings-`). [`DiskStore`] is the redb-backed production implementation;
//! [`MemoryStore`] backs tests and can simulate a fixed byte budget so quota
//! handling is exercisable without filling a real disk.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use redb::ReadableDatabase;

const VALUES_TABLE: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("values");

/// Namespace prefix for cached server responses.
pub const DATA_PREFIX: &str = "data-";
/// Namespace prefix for starred items.
pub const FAVORITES_PREFIX: &str = "favs-";
/// Namespace prefix for per-view settings documents.
pub const SETTINGS_PREFIX: &str = "settings-";

/// Errors from a local store.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store refused the write for lack of space. Callers may
    /// evict and retry.
    Quota,
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Quota => write!(f, "Storage quota exceeded"),
            StoreError::Backend(e) => write!(f, "Storage error: {e}"),
        }
    }
}

/// String-keyed persistence used by the data cache, favorites and settings
/// models. Reads are infallible by contract: a backend failure on read is
/// indistinguishable from an absent key, which degrades to a refetch rather
/// than an error surface.
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
    /// All stored keys beginning with `prefix`, in sorted order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    fn clear_prefix(&self, prefix: &str) {
        for key in self.keys_with_prefix(prefix) {
            self.remove(&key);
        }
    }
}

/// In-memory store with an optional byte budget. A budget of `None` never
/// reports quota; `Some(n)` rejects any put that would push the total size
/// of keys plus values past `n` bytes.
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, String>>,
    byte_budget: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: RefCell::new(BTreeMap::new()),
            byte_budget: None,
        }
    }

    pub fn with_byte_budget(byte_budget: usize) -> Self {
        Self {
            values: RefCell::new(BTreeMap::new()),
            byte_budget: Some(byte_budget),
        }
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.values
            .borrow()
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(budget) = self.byte_budget {
            let projected = self.used_bytes_excluding(key) + key.len() + value.len();
            if projected > budget {
                return Err(StoreError::Quota);
            }
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.values
            .borrow()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Persistent store backed by a single redb table.
pub struct DiskStore {
    db: redb::Database,
}

impl DiskStore {
    /// Open or create a store at the given directory.
    pub fn open(base_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| StoreError::Backend(format!("Failed to create dir: {e}")))?;
        let db = redb::Database::create(base_dir.join("store.redb"))
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        // Create the table up front so first reads see an empty table
        // instead of a missing one.
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        write_txn
            .open_table(VALUES_TABLE)
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        write_txn
            .commit()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        Ok(Self { db })
    }

    /// Default storage directory for application data.
    pub fn default_data_dir() -> Option<PathBuf> {
        let mut dir = dirs::config_dir()?;
        dir.push("topical-guide");
        Some(dir)
    }

    fn classify(error: redb::StorageError) -> StoreError {
        match error {
            redb::StorageError::Io(e) if e.kind() == std::io::ErrorKind::StorageFull => {
                StoreError::Quota
            },
            other => StoreError::Backend(format!("{other}")),
        }
    }
}

impl LocalStore for DiskStore {
    fn get(&self, key: &str) -> Option<String> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(VALUES_TABLE).ok()?;
        let entry = table.get(key).ok()??;
        Some(entry.value().to_string())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        {
            let mut table = write_txn
                .open_table(VALUES_TABLE)
                .map_err(|e| StoreError::Backend(format!("{e}")))?;
            table.insert(key, value).map_err(Self::classify)?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let Ok(write_txn) = self.db.begin_write() else {
            return;
        };
        {
            let Ok(mut table) = write_txn.open_table(VALUES_TABLE) else {
                return;
            };
            let _ = table.remove(key);
        }
        let _ = write_txn.commit();
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Ok(read_txn) = self.db.begin_read() else {
            return Vec::new();
        };
        let Ok(table) = read_txn.open_table(VALUES_TABLE) else {
            return Vec::new();
        };
        let Ok(iter) = table.range(prefix..) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        for entry in iter {
            let Ok((key, _)) = entry else {
                continue;
            };
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::{DiskStore, LocalStore, MemoryStore, StoreError};
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        store.put("data-a", "1").unwrap();
        assert_eq!(store.get("data-a").as_deref(), Some("1"));
        store.remove("data-a");
        assert!(store.get("data-a").is_none());
    }

    #[test]
    fn memory_store_lists_only_matching_prefix_in_sorted_order() {
        let store = MemoryStore::new();
        store.put("favs-b", "x").unwrap();
        store.put("data-z", "x").unwrap();
        store.put("data-a", "x").unwrap();
        assert_eq!(store.keys_with_prefix("data-"), vec!["data-a", "data-z"]);
    }

    #[test]
    fn memory_store_reports_quota_when_budget_exceeded() {
        let store = MemoryStore::with_byte_budget(16);
        store.put("k", "small").unwrap();
        let result = store.put("k2", "a value that does not fit");
        assert!(matches!(result, Err(StoreError::Quota)));
        // The undersized entry stays intact.
        assert_eq!(store.get("k").as_deref(), Some("small"));
    }

    #[test]
    fn memory_store_overwrite_counts_replaced_value_once() {
        let store = MemoryStore::with_byte_budget(12);
        store.put("key", "12345678").unwrap();
        // Replacing the value frees its old bytes first.
        store.put("key", "87654321").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("87654321"));
    }

    #[test]
    fn clear_prefix_leaves_other_namespaces_alone() {
        let store = MemoryStore::new();
        store.put("data-a", "1").unwrap();
        store.put("data-b", "2").unwrap();
        store.put("favs-a", "3").unwrap();
        store.clear_prefix("data-");
        assert!(store.keys_with_prefix("data-").is_empty());
        assert_eq!(store.get("favs-a").as_deref(), Some("3"));
    }

    #[test]
    fn disk_store_round_trips_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = DiskStore::open(dir.path().to_path_buf()).unwrap();
            store.put("settings-d-a-views/topics", r#"{"sort":"name"}"#).unwrap();
        }
        {
            let store = DiskStore::open(dir.path().to_path_buf()).unwrap();
            assert_eq!(
                store.get("settings-d-a-views/topics").as_deref(),
                Some(r#"{"sort":"name"}"#)
            );
        }
    }

    #[test]
    fn disk_store_prefix_scan_stops_at_namespace_boundary() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path().to_path_buf()).unwrap();
        store.put("data-a", "1").unwrap();
        store.put("favs-a", "2").unwrap();
        store.put("settings-a", "3").unwrap();
        assert_eq!(store.keys_with_prefix("data-"), vec!["data-a"]);
        assert_eq!(store.keys_with_prefix("favs-"), vec!["favs-a"]);
    }

    #[test]
    fn disk_store_missing_key_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path().to_path_buf()).unwrap();
        assert!(store.get("data-missing").is_none());
    }
}
