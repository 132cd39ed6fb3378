//! String key-value stores backing the persisted client state.
//!
//! `FileStore` keeps every key in one JSON object on disk, the way a browser
//! keeps `localStorage` for an origin. `MemoryStore` is the ephemeral variant.

use std::{
  collections::{BTreeMap, HashMap},
  fs, io,
  path::PathBuf,
  sync::Mutex,
};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, #[source] source: io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, #[source] source: io::Error },

  #[error("record '{key}' is corrupt: {reason}")]
  Corrupt { key: String, reason: String },
}

pub trait KeyValueStore: Send + Sync {
  /// `Ok(None)` when the key was never written.
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    let map = entries
      .into_iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Self { entries: Mutex::new(map) }
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// One JSON object file: `{ "<key>": "<string value>", ... }`.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  write_lock: Mutex<()>,
}

impl FileStore {
  pub fn open(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write_lock: Mutex::new(()) }
  }

  fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
    match fs::read_to_string(&self.path) {
      Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
      Ok(s) => serde_json::from_str(&s).map_err(|e| StoreError::Corrupt {
        key: self.path.display().to_string(),
        reason: e.to_string(),
      }),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(source) => Err(StoreError::Read { path: self.path.clone(), source }),
    }
  }

  fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let write_err = |source: io::Error| StoreError::Write { path: self.path.clone(), source };
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(write_err)?;
    }
    let body = serde_json::to_string_pretty(map)
      .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = self.path.with_file_name(tmp_name);
    fs::write(&tmp, body).map_err(write_err)?;
    fs::rename(&tmp, &self.path).map_err(write_err)
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.read_all()?.remove(key))
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
    let mut map = match self.read_all() {
      Ok(map) => map,
      Err(StoreError::Corrupt { reason, .. }) => {
        warn!(target: "progress", path = %self.path.display(), %reason, "State file is corrupt; starting a fresh one");
        BTreeMap::new()
      }
      Err(e) => return Err(e),
    };
    map.insert(key.to_string(), value.to_string());
    self.write_all(&map)?;
    debug!(target: "progress", path = %self.path.display(), %key, value_len = value.len(), "State written");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_store_round_trips_values() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
  }

  #[test]
  fn file_store_missing_file_reads_as_absent() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("state.json"));
    assert_eq!(store.get("anything").unwrap(), None);
  }

  #[test]
  fn file_store_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");
    FileStore::open(&path).set("sidebarWidth", "320px").unwrap();

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("sidebarWidth").unwrap().as_deref(), Some("320px"));
  }

  #[test]
  fn file_store_reports_corrupt_file_and_recovers_on_write() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{ not json").unwrap();

    let store = FileStore::open(&path);
    assert!(matches!(store.get("k"), Err(StoreError::Corrupt { .. })));

    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
  }

  #[test]
  fn file_store_write_failure_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file, not a directory").unwrap();

    let store = FileStore::open(blocker.join("state.json"));
    assert!(store.set("k", "v").is_err());
  }
}
