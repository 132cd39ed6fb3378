//! Client configuration: built-in defaults, an optional TOML file, then
//! environment variables.
//!
//! Environment:
//!   PRACTICE_CONFIG_PATH          : optional TOML file (same keys as `ConfigFile`)
//!   PRACTICE_BASE_URL             : server origin (default "http://127.0.0.1:5000")
//!   PRACTICE_STATE_PATH           : persisted client state (default ".practice_state.json")
//!   PRACTICE_HINT_TIMEOUT_SECS    : hint abort deadline (default 45)
//!   PRACTICE_HINT_NOTICE_SECS     : "still generating" notice delay (default 10)
//!   PRACTICE_CONNECT_TIMEOUT_SECS : TCP connect timeout (default 10)
//!   PRACTICE_DISCARD_STALE        : drop responses of superseded submissions (default true)
//!   PRACTICE_REPORT_PROGRESS      : POST progress to the server after a full pass (default false)

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_STATE_PATH: &str = ".practice_state.json";
pub const DEFAULT_HINT_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_HINT_NOTICE: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
  pub base_url: String,
  pub state_path: PathBuf,
  pub hint_timeout: Duration,
  pub hint_slow_notice: Duration,
  pub connect_timeout: Duration,
  /// When false, whichever submission response arrives last owns the panel.
  pub discard_stale_responses: bool,
  pub report_progress: bool,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.into(),
      state_path: PathBuf::from(DEFAULT_STATE_PATH),
      hint_timeout: DEFAULT_HINT_TIMEOUT,
      hint_slow_notice: DEFAULT_HINT_NOTICE,
      connect_timeout: DEFAULT_CONNECT_TIMEOUT,
      discard_stale_responses: true,
      report_progress: false,
    }
  }
}

/// Keys accepted in the TOML file. Everything is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  #[serde(default)] pub base_url: Option<String>,
  #[serde(default)] pub state_path: Option<PathBuf>,
  #[serde(default)] pub hint_timeout_secs: Option<u64>,
  #[serde(default)] pub hint_notice_secs: Option<u64>,
  #[serde(default)] pub connect_timeout_secs: Option<u64>,
  #[serde(default)] pub discard_stale_responses: Option<bool>,
  #[serde(default)] pub report_progress: Option<bool>,
}

impl ClientConfig {
  /// Defaults, then `PRACTICE_CONFIG_PATH`, then individual env vars.
  pub fn from_env() -> Result<Self, ClientError> {
    let mut cfg = Self::default();
    if let Some(file) = load_config_file_from_env() {
      cfg.apply_file(file);
    }
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn apply_file(&mut self, file: ConfigFile) {
    if let Some(v) = file.base_url { self.base_url = v; }
    if let Some(v) = file.state_path { self.state_path = v; }
    if let Some(v) = file.hint_timeout_secs { self.hint_timeout = Duration::from_secs(v); }
    if let Some(v) = file.hint_notice_secs { self.hint_slow_notice = Duration::from_secs(v); }
    if let Some(v) = file.connect_timeout_secs { self.connect_timeout = Duration::from_secs(v); }
    if let Some(v) = file.discard_stale_responses { self.discard_stale_responses = v; }
    if let Some(v) = file.report_progress { self.report_progress = v; }
  }

  /// Overlay values from an env-like lookup. Unparseable values are logged and skipped.
  pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PRACTICE_BASE_URL") { self.base_url = v; }
    if let Some(v) = lookup("PRACTICE_STATE_PATH") { self.state_path = PathBuf::from(v); }
    if let Some(v) = parse_var(&lookup, "PRACTICE_HINT_TIMEOUT_SECS") {
      self.hint_timeout = Duration::from_secs(v);
    }
    if let Some(v) = parse_var(&lookup, "PRACTICE_HINT_NOTICE_SECS") {
      self.hint_slow_notice = Duration::from_secs(v);
    }
    if let Some(v) = parse_var(&lookup, "PRACTICE_CONNECT_TIMEOUT_SECS") {
      self.connect_timeout = Duration::from_secs(v);
    }
    if let Some(v) = parse_var(&lookup, "PRACTICE_DISCARD_STALE") {
      self.discard_stale_responses = v;
    }
    if let Some(v) = parse_var(&lookup, "PRACTICE_REPORT_PROGRESS") {
      self.report_progress = v;
    }
  }

  pub fn validate(&self) -> Result<(), ClientError> {
    if self.base_url.trim().is_empty() {
      return Err(ClientError::Config("base_url must not be empty".into()));
    }
    if self.hint_timeout.is_zero() {
      return Err(ClientError::Config("hint timeout must be positive".into()));
    }
    if self.hint_slow_notice >= self.hint_timeout {
      warn!(
        target: "practice_client",
        notice = ?self.hint_slow_notice,
        timeout = ?self.hint_timeout,
        "Hint notice is not shorter than the hint timeout; it will never show"
      );
    }
    Ok(())
  }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
  T: std::str::FromStr,
  F: Fn(&str) -> Option<String>,
{
  let raw = lookup(key)?;
  match raw.trim().parse::<T>() {
    Ok(v) => Some(v),
    Err(_) => {
      warn!(target: "practice_client", %key, value = %raw, "Ignoring unparseable config value");
      None
    }
  }
}

/// Overrides from the TOML file named by `PRACTICE_CONFIG_PATH`, if set.
/// An unreadable or invalid file is logged and skipped so env vars and
/// defaults still apply.
pub fn load_config_file_from_env() -> Option<ConfigFile> {
  let path = PathBuf::from(std::env::var_os("PRACTICE_CONFIG_PATH")?);
  let parsed = std::fs::read_to_string(&path)
    .map_err(|e| e.to_string())
    .and_then(|raw| toml::from_str::<ConfigFile>(&raw).map_err(|e| e.to_string()));
  match parsed {
    Ok(file) => {
      info!(target: "practice_client", path = %path.display(), "Client config file applied");
      Some(file)
    }
    Err(reason) => {
      error!(target: "practice_client", path = %path.display(), %reason, "Ignoring client config file");
      None
    }
  }
}
