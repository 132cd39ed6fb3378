//! Question catalog: the full question set and single-question detail fetches.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::domain::Question;
use crate::error::ClientError;

/// Questions keyed as served, iterated in server order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
  order: Vec<String>,
  by_key: HashMap<String, Question>,
}

impl Catalog {
  /// Keyed by each question's own id.
  pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
    let mut catalog = Catalog::default();
    for q in questions {
      catalog.insert(q.id.clone(), q);
    }
    catalog
  }

  fn insert(&mut self, key: String, q: Question) {
    if self.by_key.insert(key.clone(), q).is_none() {
      self.order.push(key);
    }
  }

  /// Decodes the `/api/questions` body. Entries that are not question
  /// records are skipped; nothing usable at all is `CatalogUnavailable`.
  pub fn from_json(body: &str) -> Result<Self, ClientError> {
    let map: serde_json::Map<String, Value> = match serde_json::from_str(body) {
      Ok(Value::Object(map)) => map,
      Ok(_) => return Err(ClientError::CatalogUnavailable("response is not a question mapping".into())),
      Err(e) => return Err(ClientError::CatalogUnavailable(format!("undecodable response: {e}"))),
    };

    let mut catalog = Catalog::default();
    for (key, value) in map {
      match serde_json::from_value::<Question>(value) {
        Ok(q) => catalog.insert(key, q),
        Err(e) => warn!(target: "catalog", %key, error = %e, "Skipping malformed question record"),
      }
    }
    if catalog.is_empty() {
      return Err(ClientError::CatalogUnavailable("No questions available. API returned empty data.".into()));
    }
    Ok(catalog)
  }

  pub fn get(&self, key: &str) -> Option<&Question> {
    self.by_key.get(key)
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Question> + '_ {
    self.order.iter().filter_map(|k| self.by_key.get(k))
  }
}

#[derive(Clone, Debug)]
pub struct CatalogClient {
  api: ApiClient,
}

impl CatalogClient {
  pub fn new(api: ApiClient) -> Self {
    Self { api }
  }

  /// GET /api/questions. Never retried here; the caller surfaces the failure.
  #[instrument(level = "info", skip(self))]
  pub async fn load_all(&self) -> Result<Catalog, ClientError> {
    let reply = self
      .api
      .get(&["api", "questions"])
      .await
      .map_err(|e| ClientError::CatalogUnavailable(e.to_string()))?;
    if !reply.is_success() {
      return Err(ClientError::CatalogUnavailable(format!("HTTP error! status: {}", reply.status)));
    }
    let catalog = Catalog::from_json(&reply.body)?;
    info!(target: "catalog", count = catalog.len(), "Question catalog loaded");
    Ok(catalog)
  }

  /// GET /api/questions/{id}.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn load_detail(&self, id: &str) -> Result<Question, ClientError> {
    let reply = self.api.get(&["api", "questions", id]).await?;
    if !reply.is_success() {
      warn!(target: "catalog", %id, status = reply.status, "Question detail not found");
      return Err(ClientError::NotFound { id: id.to_string(), status: reply.status });
    }
    let q: Question = reply.json()?;
    debug!(target: "catalog", %id, title = %q.title, "Question detail loaded");
    Ok(q)
  }

  /// POST /api/questions/{id}/progress with a JSON object of fields to merge.
  #[instrument(level = "debug", skip(self, fields), fields(%id))]
  pub async fn report_progress(&self, id: &str, fields: &Value) -> Result<(), ClientError> {
    let reply = self.api.post(&["api", "questions", id, "progress"], fields).await?;
    match reply.status {
      s if (200..300).contains(&s) => Ok(()),
      404 => Err(ClientError::NotFound { id: id.to_string(), status: 404 }),
      s => Err(ClientError::server(Some(s), format!("Server error: {} - {}", s, reply.snippet(200)))),
    }
  }
}
