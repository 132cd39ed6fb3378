//! The single controller that owns a session and wires the components.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::catalog::CatalogClient;
use crate::config::ClientConfig;
use crate::domain::Question;
use crate::error::ClientError;
use crate::hints::HintController;
use crate::listing::{self, Filter, ListView};
use crate::progress::Progress;
use crate::session::Session;
use crate::store::{FileStore, KeyValueStore};
use crate::submission::SubmissionController;
use crate::view::Node;

/// Panel geometry as persisted, for the layout commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
  pub panels: BTreeMap<String, String>,
  pub sidebar_width: Option<String>,
}

pub struct Workbench {
  config: Arc<ClientConfig>,
  session: Arc<Session>,
  progress: Progress,
  catalog: CatalogClient,
  submissions: SubmissionController,
  hints: HintController,
}

impl Workbench {
  pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
    config.validate()?;
    let api = ApiClient::new(&config)?;
    let session = Arc::new(Session::new());
    let progress = Progress::new(store);
    let submissions = SubmissionController::new(
      api.clone(),
      session.clone(),
      progress.clone(),
      config.discard_stale_responses,
      config.report_progress,
    );
    let hints = HintController::new(api.clone(), session.clone(), config.hint_timeout, config.hint_slow_notice);
    info!(
      target: "practice_client",
      session = %session.id,
      base_url = %api.base_url(),
      "Workbench ready"
    );
    Ok(Self { config: Arc::new(config), session, progress, catalog: CatalogClient::new(api), submissions, hints })
  }

  /// Persists to the JSON file at `config.state_path`.
  pub fn with_file_store(config: ClientConfig) -> Result<Self, ClientError> {
    let store = Arc::new(FileStore::open(config.state_path.clone()));
    Self::new(config, store)
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn session(&self) -> &Arc<Session> {
    &self.session
  }

  pub fn progress(&self) -> &Progress {
    &self.progress
  }

  pub fn submissions(&self) -> &SubmissionController {
    &self.submissions
  }

  pub fn hints(&self) -> &HintController {
    &self.hints
  }

  /// Fetches the catalog. On failure the list shows the error and the
  /// previous catalog, if any, is kept.
  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn load_questions(&self) -> Result<usize, ClientError> {
    match self.catalog.load_all().await {
      Ok(catalog) => {
        let count = catalog.len();
        *self.session.catalog.write().await = catalog;
        self.session.refresh_list(&self.progress).await;
        Ok(count)
      }
      Err(e) => {
        warn!(target: "catalog", error = %e, "Question catalog unavailable");
        let message = match &e {
          ClientError::CatalogUnavailable(msg) => msg.clone(),
          other => other.to_string(),
        };
        *self.session.list.write().await = ListView::Unavailable(message);
        Err(e)
      }
    }
  }

  pub async fn set_filter(&self, filter: Filter) -> ListView {
    *self.session.filter.write().await = filter;
    self.session.refresh_list(&self.progress).await
  }

  pub async fn list_view(&self) -> ListView {
    self.session.list.read().await.clone()
  }

  /// Loads the detail record, makes it current, loads its template into
  /// the code buffer and marks it active in the list.
  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn select_question(&self, id: &str) -> Result<Arc<Question>, ClientError> {
    let question = Arc::new(self.catalog.load_detail(id).await?);
    *self.session.current.write().await = Some(question.clone());
    self.session.set_code(question.template.clone()).await;
    self.submissions.clear_results().await;
    self.hints.close().await;
    self.session.refresh_list(&self.progress).await;
    info!(target: "practice_client", %id, title = %question.title, "Question selected");
    Ok(question)
  }

  pub async fn set_code(&self, code: impl Into<String>) {
    self.session.set_code(code).await;
  }

  /// Question panel with the current success badge.
  pub async fn question_view(&self) -> Option<Node> {
    let question = self.session.current_question().await?;
    let count = self.progress.count(&question.id);
    Some(listing::question_panel(&question, count))
  }

  /// Replaces the code buffer with the shown solution and closes the panel.
  pub async fn copy_solution_to_editor(&self) -> bool {
    let Some(code) = self.hints.solution_code().await else { return false };
    self.session.set_code(code).await;
    self.hints.close().await;
    true
  }

  pub fn layout(&self) -> Layout {
    Layout { panels: self.progress.panel_sizes(), sidebar_width: self.progress.sidebar_width() }
  }
}
