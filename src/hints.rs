//! Hints and solutions for the current question.
//!
//! A hint request runs under a hard client-side timeout. A second, shorter
//! timer only swaps the waiting message; it never aborts the request.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::domain::{HintType, Question};
use crate::error::ClientError;
use crate::markup::{self, Block, Section};
use crate::protocol::{HintIn, HintOut, SolutionIn, SolutionOut};
use crate::session::Session;
use crate::view::{el, Node};

pub const SOLUTION_MISSING: &str = "The solution for this problem is not yet in the knowledge base.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolutionView {
  pub approach: Option<String>,
  pub time_complexity: Option<String>,
  pub space_complexity: Option<String>,
  pub explanation: Vec<Section>,
  pub code: String,
}

impl SolutionView {
  fn from_out(out: SolutionOut, code: String) -> Self {
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    Self {
      approach: non_empty(out.approach),
      time_complexity: non_empty(out.time_complexity),
      space_complexity: non_empty(out.space_complexity),
      explanation: out.explanation.as_deref().map(markup::format_explanation).unwrap_or_default(),
      code,
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HintPanel {
  #[default]
  Hidden,
  Generating { hint_type: HintType, slow: bool },
  Hint(Vec<Block>),
  /// The server answered without a hint.
  Fallback,
  /// No answer within the hint timeout; retry with the same type.
  TimedOut { hint_type: HintType },
  /// Any other failure; a static generic hint.
  Unavailable,
  LoadingSolution,
  Solution(SolutionView),
  SolutionNotAvailable { message: String },
  SolutionFailed,
}

#[derive(Clone)]
pub struct HintController {
  api: ApiClient,
  session: Arc<Session>,
  timeout: Duration,
  slow_notice: Duration,
}

impl HintController {
  pub fn new(api: ApiClient, session: Arc<Session>, timeout: Duration, slow_notice: Duration) -> Self {
    Self { api, session, timeout, slow_notice }
  }

  /// POST /api/hint. `Ok(None)` when the server answered without a hint.
  pub async fn fetch_hint(
    &self,
    question: &Question,
    code: &str,
    hint_type: HintType,
  ) -> Result<Option<String>, ClientError> {
    let body = HintIn { question, code, hint_type };
    let reply = tokio::time::timeout(self.timeout, self.api.post(&["api", "hint"], &body))
      .await
      .map_err(|_| ClientError::Timeout(self.timeout))??;
    if !reply.is_success() {
      return Err(ClientError::server(
        Some(reply.status),
        format!("Server error: {} - {}", reply.status, reply.snippet(200)),
      ));
    }
    let out: HintOut = reply.json()?;
    debug!(target: "hint", rag_available = ?out.rag_available, "Hint response decoded");
    Ok(out.hint.filter(|h| !h.trim().is_empty()))
  }

  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn get_hint(&self, hint_type: HintType) -> Result<HintPanel, ClientError> {
    let question = self.session.current_question().await.ok_or(ClientError::NoQuestionSelected)?;
    let code = self.session.code().await;
    *self.session.hint_type.write().await = hint_type;
    *self.session.hint_panel.write().await = HintPanel::Generating { hint_type, slow: false };

    let fetch = self.fetch_hint(&question, &code, hint_type);
    tokio::pin!(fetch);
    let notice = tokio::time::sleep(self.slow_notice);
    tokio::pin!(notice);
    let mut noticed = false;
    let result = loop {
      tokio::select! {
        res = &mut fetch => break res,
        _ = &mut notice, if !noticed => {
          noticed = true;
          let mut panel = self.session.hint_panel.write().await;
          if let HintPanel::Generating { slow, .. } = &mut *panel {
            *slow = true;
          }
          debug!(target: "hint", "Hint still generating");
        }
      }
    };

    let panel = match result {
      Ok(Some(hint)) => {
        info!(target: "hint", id = %question.id, hint_type = hint_type.as_str(), len = hint.len(), "Hint received");
        HintPanel::Hint(markup::format_hint(&hint))
      }
      Ok(None) => HintPanel::Fallback,
      Err(e) if e.is_timeout() => {
        warn!(target: "hint", id = %question.id, timeout = ?self.timeout, "Hint request timed out");
        HintPanel::TimedOut { hint_type }
      }
      Err(e) => {
        warn!(target: "hint", id = %question.id, error = %e, "Hint request failed");
        HintPanel::Unavailable
      }
    };
    *self.session.hint_panel.write().await = panel.clone();
    Ok(panel)
  }

  /// Retries with the last requested hint type.
  pub async fn retry_hint(&self) -> Result<HintPanel, ClientError> {
    let hint_type = *self.session.hint_type.read().await;
    self.get_hint(hint_type).await
  }

  async fn fetch_solution(&self, question: &Question) -> Result<SolutionOut, ClientError> {
    let reply = self.api.post(&["api", "solution"], &SolutionIn { question }).await?;
    if !reply.is_success() {
      return Err(ClientError::server(Some(reply.status), format!("Server error: {}", reply.status)));
    }
    reply.json()
  }

  /// A missing solution is a normal outcome, not an error.
  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn show_solution(&self) -> Result<HintPanel, ClientError> {
    let question = self.session.current_question().await.ok_or(ClientError::NoQuestionSelected)?;
    *self.session.hint_panel.write().await = HintPanel::LoadingSolution;

    let panel = match self.fetch_solution(&question).await {
      Ok(mut out) if out.available && out.solution.is_some() => {
        let code = out.solution.take().unwrap_or_default();
        HintPanel::Solution(SolutionView::from_out(out, code))
      }
      Ok(out) => {
        info!(target: "hint", id = %question.id, "Solution not available");
        let message = out.message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| SOLUTION_MISSING.into());
        HintPanel::SolutionNotAvailable { message }
      }
      Err(e) => {
        warn!(target: "hint", id = %question.id, error = %e, "Solution request failed");
        HintPanel::SolutionFailed
      }
    };
    *self.session.hint_panel.write().await = panel.clone();
    Ok(panel)
  }

  pub async fn close(&self) {
    *self.session.hint_panel.write().await = HintPanel::Hidden;
  }

  /// Code of the solution currently shown, if any.
  pub async fn solution_code(&self) -> Option<String> {
    match &*self.session.hint_panel.read().await {
      HintPanel::Solution(view) => Some(view.code.clone()),
      _ => None,
    }
  }
}

fn hint_message(children: Vec<Node>) -> Node {
  el("div").class("hint-message").children(children).into()
}

fn retry_button(action: &'static str) -> Node {
  el("button").class("btn btn-hint-small").attr("data-action", action).text("🔄 Retry").into()
}

impl SolutionView {
  pub fn render(&self) -> Node {
    let meta_item = |label: &str, value: &str| -> Node {
      el("div").class("meta-item").child(el("strong").text(format!("{label}: "))).text(value.to_string()).into()
    };
    let mut meta = el("div").class("solution-meta");
    if let Some(approach) = &self.approach {
      meta = meta.child(meta_item("Approach", approach.as_str()));
    }
    if let Some(time) = &self.time_complexity {
      meta = meta.child(meta_item("Time Complexity", time.as_str()));
    }
    if let Some(space) = &self.space_complexity {
      meta = meta.child(meta_item("Space Complexity", space.as_str()));
    }

    let mut container = el("div")
      .class("solution-container")
      .child(
        el("div")
          .class("solution-header")
          .child(el("h4").text("💻 Optimal Solution"))
          .child(el("span").class("solution-warning").text("⚠️ Viewing the solution - Try solving it yourself first!")),
      )
      .child(meta);
    if !self.explanation.is_empty() {
      container = container.child(
        el("div")
          .class("solution-explanation")
          .child(el("strong").text("📚 Detailed Explanation:"))
          .child(markup::render_sections(&self.explanation)),
      );
    }
    container
      .child(
        el("div")
          .class("solution-code")
          .child(el("div").class("code-header").child(el("strong").text("Solution Code:")))
          .child(el("pre").child(el("code").class("language-python").text(self.code.clone()))),
      )
      .into()
  }
}

impl HintPanel {
  pub fn is_visible(&self) -> bool {
    !matches!(self, HintPanel::Hidden)
  }

  pub fn render(&self) -> Node {
    match self {
      HintPanel::Hidden => Node::Fragment(Vec::new()),
      HintPanel::Generating { slow: false, .. } => el("div")
        .class("loading")
        .text("🤔 Generating hint... (this may take 15-30 seconds on first request)")
        .into(),
      HintPanel::Generating { slow: true, .. } => el("div")
        .class("loading")
        .text("🤔 Still generating... LLM is processing (this can take up to 30 seconds)")
        .into(),
      HintPanel::Hint(blocks) => hint_message(vec![markup::render_blocks(blocks)]),
      HintPanel::Fallback => hint_message(vec![
        el("strong").text("💡 Hint:").into(),
        el("p").text("Consider these questions:").into(),
        el("ul")
          .child(el("li").text("What data structure fits this problem?"))
          .child(el("li").text("Can you solve it in O(n) time?"))
          .child(el("li").text("Have you seen a similar pattern before?"))
          .into(),
      ]),
      HintPanel::TimedOut { hint_type } => el("div")
        .class("error-message")
        .attr("data-hint-type", hint_type.as_str())
        .child(el("strong").text("⏱️ Request Timeout"))
        .child(el("p").text(
          "The hint generation took too long. This can happen on the first request when the LLM is loading.",
        ))
        .child(
          el("p")
            .child(el("strong").text("Try again: "))
            .text("The LLM should be loaded now, so subsequent hints will be faster."),
        )
        .child(retry_button("hint"))
        .into(),
      HintPanel::Unavailable => hint_message(vec![
        el("strong").text("💡 Hint:").into(),
        el("p").text("Break down the problem:").into(),
        el("ol")
          .child(el("li").text("Understand the input and output"))
          .child(el("li").text("Think about edge cases"))
          .child(el("li").text("Consider what data structure would help"))
          .child(el("li").text("Start with a brute force solution, then optimize"))
          .into(),
        el("p")
          .child(el("small").text("Note: AI hint generation encountered an error. Showing fallback hint."))
          .into(),
      ]),
      HintPanel::LoadingSolution => el("div").class("loading").text("🔍 Loading solution...").into(),
      HintPanel::Solution(view) => view.render(),
      HintPanel::SolutionNotAvailable { message } => hint_message(vec![
        el("strong").text("💡 Solution Not Available").into(),
        el("p").text(message.clone()).into(),
        el("p").text("Try solving it step by step using the hint buttons!").into(),
      ]),
      HintPanel::SolutionFailed => el("div")
        .class("error-message")
        .child(el("strong").text("❌ Error Loading Solution"))
        .child(el("p").text("Failed to load the solution. Please try again."))
        .child(retry_button("solution"))
        .into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timeout_and_generic_failure_render_differently() {
    let timed_out = HintPanel::TimedOut { hint_type: HintType::Specific }.render();
    let unavailable = HintPanel::Unavailable.render();
    assert!(timed_out.to_text().contains("Request Timeout"));
    assert_eq!(timed_out.find_class("error-message").unwrap().get_attr("data-hint-type"), Some("specific"));
    assert!(!unavailable.to_text().contains("Request Timeout"));
    assert!(unavailable.to_text().contains("Showing fallback hint."));
  }

  #[test]
  fn slow_notice_changes_message_only() {
    let fresh = HintPanel::Generating { hint_type: HintType::General, slow: false }.render().to_text();
    let slow = HintPanel::Generating { hint_type: HintType::General, slow: true }.render().to_text();
    assert!(fresh.contains("Generating hint..."));
    assert!(slow.contains("Still generating..."));
  }

  #[test]
  fn solution_view_skips_missing_meta_and_escapes_code() {
    let out = SolutionOut {
      available: true,
      approach: Some("Hash map".into()),
      time_complexity: Some(" ".into()),
      explanation: Some("**Key Insight:** pairs".into()),
      ..Default::default()
    };
    let view = SolutionView::from_out(out, "if a < b: pass".into());
    assert!(view.time_complexity.is_none());
    let html = view.render().to_html();
    assert!(html.contains("Approach: </strong>Hash map"));
    assert!(!html.contains("Time Complexity"));
    assert!(html.contains("if a &lt; b: pass"));
    assert!(html.contains("insight-section"));
  }

  #[test]
  fn hidden_panel_renders_nothing() {
    assert!(!HintPanel::Hidden.is_visible());
    assert_eq!(HintPanel::Hidden.render().to_html(), "");
  }
}
