//! Session context: everything one user session reads and writes.
//!
//! Owned by the `Workbench` and shared with each controller as `Arc<Session>`.
//! The generation counter hands out one token per submission so late
//! responses can be recognized.

use std::sync::{
  atomic::{AtomicU64, Ordering},
  Arc,
};

use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::{HintType, Question};
use crate::hints::HintPanel;
use crate::listing::{self, Filter, ListView};
use crate::progress::Progress;
use crate::submission::ResultsPanel;

pub struct Session {
  pub id: Uuid,
  pub catalog: RwLock<Catalog>,
  pub current: RwLock<Option<Arc<Question>>>,
  pub code: RwLock<String>,
  pub filter: RwLock<Filter>,
  pub hint_type: RwLock<HintType>,
  pub results: RwLock<ResultsPanel>,
  pub hint_panel: RwLock<HintPanel>,
  pub list: RwLock<ListView>,
  generation: AtomicU64,
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

impl Session {
  pub fn new() -> Self {
    Self {
      id: Uuid::new_v4(),
      catalog: RwLock::new(Catalog::default()),
      current: RwLock::new(None),
      code: RwLock::new(String::new()),
      filter: RwLock::new(Filter::All),
      hint_type: RwLock::new(HintType::General),
      results: RwLock::new(ResultsPanel::Placeholder),
      hint_panel: RwLock::new(HintPanel::Hidden),
      list: RwLock::new(ListView::Loading),
      generation: AtomicU64::new(0),
    }
  }

  /// Issues the token for a new submission; it becomes the latest.
  pub fn next_token(&self) -> u64 {
    self.generation.fetch_add(1, Ordering::SeqCst) + 1
  }

  pub fn latest_token(&self) -> u64 {
    self.generation.load(Ordering::SeqCst)
  }

  pub fn is_latest(&self, token: u64) -> bool {
    token == self.latest_token()
  }

  pub async fn current_question(&self) -> Option<Arc<Question>> {
    self.current.read().await.clone()
  }

  pub async fn code(&self) -> String {
    self.code.read().await.clone()
  }

  pub async fn set_code(&self, code: impl Into<String>) {
    *self.code.write().await = code.into();
  }

  /// Re-projects the question list from the catalog, filter, selection and
  /// the persisted success counters.
  #[instrument(level = "debug", skip_all, fields(session = %self.id))]
  pub async fn refresh_list(&self, progress: &Progress) -> ListView {
    let filter = *self.filter.read().await;
    let active = self.current.read().await.as_ref().map(|q| q.id.clone());
    let counts = progress.all_counts();
    let view = {
      let catalog = self.catalog.read().await;
      if catalog.is_empty() {
        // Keep Loading/Unavailable as they are until a catalog arrives.
        return self.list.read().await.clone();
      }
      listing::project(catalog.iter(), filter, &counts, active.as_deref())
    };
    debug!(target: "practice_client", %filter, entries = view.entries().len(), "List re-projected");
    *self.list.write().await = view.clone();
    view
  }
}
