//! Error taxonomy of the client.
//!
//! Catalog and submission boundaries convert these into panel view models;
//! the persistence adapter swallows them unless a `*_checked` / `try_*`
//! variant is used.

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
  /// The catalog endpoint failed or returned no usable questions.
  #[error("question catalog unavailable: {0}")]
  CatalogUnavailable(String),

  #[error("question not found: {id} (status {status})")]
  NotFound { id: String, status: u16 },

  /// The compile check rejected the code.
  #[error("syntax error: {0}")]
  SyntaxError(String),

  #[error("runtime error: {0}")]
  RuntimeError(String),

  /// Unexpected HTTP status, transport failure or undecodable body.
  #[error("{message}")]
  ServerError { status: Option<u16>, message: String },

  #[error("request timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  #[error("persisted record '{key}' is corrupt: {reason}")]
  PersistenceCorrupt { key: String, reason: String },

  #[error("storage failure: {0}")]
  Storage(String),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("no question selected")]
  NoQuestionSelected,
}

impl ClientError {
  pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
    ClientError::ServerError { status, message: message.into() }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, ClientError::Timeout(_))
  }
}

impl From<StoreError> for ClientError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Corrupt { key, reason } => ClientError::PersistenceCorrupt { key, reason },
      other => ClientError::Storage(other.to_string()),
    }
  }
}

pub type ClientResult<T> = Result<T, ClientError>;
