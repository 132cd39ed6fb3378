//! Persisted per-question success counters and panel geometry.
//!
//! Plain accessors never fail: a missing or malformed record reads as empty
//! and write failures are logged and swallowed. The `*_checked` and `try_*`
//! variants expose what actually happened.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, Mutex},
};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ClientError;
use crate::store::KeyValueStore;

pub const SUCCESS_COUNTS_KEY: &str = "problem_success_counts";
pub const PANEL_SIZES_KEY: &str = "panelSizes";
pub const SIDEBAR_WIDTH_KEY: &str = "sidebarWidth";

pub const SIDEBAR_MIN_PX: u32 = 200;
pub const SIDEBAR_MAX_PX: u32 = 600;
pub const PANEL_MIN_PX: u32 = 100;

/// A value read from the store, tagged with whether a default replaced a
/// corrupt record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Loaded<T> {
  Fresh(T),
  Corrupt(T),
}

impl<T> Loaded<T> {
  pub fn into_inner(self) -> T {
    match self {
      Loaded::Fresh(v) | Loaded::Corrupt(v) => v,
    }
  }

  pub fn is_corrupt(&self) -> bool {
    matches!(self, Loaded::Corrupt(_))
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
    match self {
      Loaded::Fresh(v) => Loaded::Fresh(f(v)),
      Loaded::Corrupt(v) => Loaded::Corrupt(f(v)),
    }
  }
}

#[derive(Clone)]
pub struct Progress {
  store: Arc<dyn KeyValueStore>,
  rmw: Arc<Mutex<()>>,
}

impl Progress {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self { store, rmw: Arc::new(Mutex::new(())) }
  }

  /// Raw JSON object under `key`, or why it could not be read.
  fn read_object(&self, key: &str) -> Result<serde_json::Map<String, Value>, ClientError> {
    let raw = self.store.get(key)?;
    let Some(raw) = raw else { return Ok(serde_json::Map::new()) };
    match serde_json::from_str::<Value>(&raw) {
      Ok(Value::Object(map)) => Ok(map),
      Ok(other) => Err(ClientError::PersistenceCorrupt {
        key: key.to_string(),
        reason: format!("expected a JSON object, found {}", json_kind(&other)),
      }),
      Err(e) => Err(ClientError::PersistenceCorrupt { key: key.to_string(), reason: e.to_string() }),
    }
  }

  fn read_counts(&self) -> Result<BTreeMap<String, u64>, ClientError> {
    let map = self.read_object(SUCCESS_COUNTS_KEY)?;
    Ok(
      map
        .into_iter()
        .filter_map(|(id, v)| match v.as_u64() {
          Some(n) => Some((id, n)),
          None => {
            debug!(target: "progress", %id, "Dropping non-integer success count");
            None
          }
        })
        .collect(),
    )
  }

  pub fn all_counts_checked(&self) -> Loaded<HashMap<String, u64>> {
    match self.read_counts() {
      Ok(counts) => Loaded::Fresh(counts.into_iter().collect()),
      Err(e) => {
        warn!(target: "progress", error = %e, "Success counters unreadable; treating as empty");
        Loaded::Corrupt(HashMap::new())
      }
    }
  }

  pub fn all_counts(&self) -> HashMap<String, u64> {
    self.all_counts_checked().into_inner()
  }

  pub fn count_checked(&self, question_id: &str) -> Loaded<u64> {
    self
      .all_counts_checked()
      .map(|counts| counts.get(question_id).copied().unwrap_or(0))
  }

  pub fn count(&self, question_id: &str) -> u64 {
    self.count_checked(question_id).into_inner()
  }

  /// Add one confirmed full pass. A corrupt record is left untouched.
  #[instrument(level = "debug", skip(self), target = "progress")]
  pub fn try_increment(&self, question_id: &str) -> Result<u64, ClientError> {
    let _guard = self.rmw.lock().unwrap_or_else(|e| e.into_inner());
    let mut counts = self.read_counts()?;
    let entry = counts.entry(question_id.to_string()).or_insert(0);
    *entry = entry.saturating_add(1);
    let updated = *entry;
    let body = serde_json::to_string(&counts)
      .map_err(|e| ClientError::Storage(e.to_string()))?;
    self.store.set(SUCCESS_COUNTS_KEY, &body)?;
    debug!(target: "progress", %question_id, count = updated, "Success count incremented");
    Ok(updated)
  }

  /// Returns the new count, or 0 when the update could not be persisted.
  pub fn increment(&self, question_id: &str) -> u64 {
    match self.try_increment(question_id) {
      Ok(n) => n,
      Err(e) => {
        warn!(target: "progress", %question_id, error = %e, "Error saving success count");
        0
      }
    }
  }

  pub fn panel_sizes_checked(&self) -> Loaded<BTreeMap<String, String>> {
    match self.read_object(PANEL_SIZES_KEY) {
      Ok(map) => Loaded::Fresh(
        map
          .into_iter()
          .filter_map(|(panel, v)| match v {
            Value::String(s) if !s.is_empty() => Some((panel, s)),
            _ => None,
          })
          .collect(),
      ),
      Err(e) => {
        warn!(target: "progress", error = %e, "Panel sizes unreadable; treating as empty");
        Loaded::Corrupt(BTreeMap::new())
      }
    }
  }

  pub fn panel_sizes(&self) -> BTreeMap<String, String> {
    self.panel_sizes_checked().into_inner()
  }

  /// Last write wins per panel id.
  pub fn save_panel_size(&self, panel_id: &str, size: &str) {
    let _guard = self.rmw.lock().unwrap_or_else(|e| e.into_inner());
    let mut sizes = self.panel_sizes_checked().into_inner();
    sizes.insert(panel_id.to_string(), size.to_string());
    let result = serde_json::to_string(&sizes)
      .map_err(|e| ClientError::Storage(e.to_string()))
      .and_then(|body| self.store.set(PANEL_SIZES_KEY, &body).map_err(ClientError::from));
    if let Err(e) = result {
      warn!(target: "progress", %panel_id, error = %e, "Error saving panel size");
    }
  }

  /// Height of a panel from a pixel value, at least `PANEL_MIN_PX`.
  pub fn save_panel_height_px(&self, panel_id: &str, px: u32) -> String {
    let size = format!("{}px", px.max(PANEL_MIN_PX));
    self.save_panel_size(panel_id, &size);
    size
  }

  pub fn sidebar_width(&self) -> Option<String> {
    match self.store.get(SIDEBAR_WIDTH_KEY) {
      Ok(v) => v.filter(|s| !s.trim().is_empty()),
      Err(e) => {
        warn!(target: "progress", error = %e, "Error loading sidebar width");
        None
      }
    }
  }

  /// Stores the width clamped to `SIDEBAR_MIN_PX..=SIDEBAR_MAX_PX` and returns it.
  pub fn save_sidebar_width_px(&self, px: u32) -> String {
    let width = format!("{}px", px.clamp(SIDEBAR_MIN_PX, SIDEBAR_MAX_PX));
    if let Err(e) = self.store.set(SIDEBAR_WIDTH_KEY, &width) {
      warn!(target: "progress", error = %e, "Error saving sidebar width");
    }
    width
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
