//! Compile, execute and run-tests round trips and the results panel they feed.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::catalog::CatalogClient;
use crate::domain::{ExecutionError, ExecutionOutcome, Question, TestResult};
use crate::error::ClientError;
use crate::progress::Progress;
use crate::protocol::{CodeIn, CompileOut, ExecuteOut, RunIn, RunRejection};
use crate::session::Session;
use crate::util::{json_display, times};
use crate::view::{el, fragment, Node};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
  Idle,
  Pending,
  Succeeded,
  PartialFailure,
  Failed,
  ServerError,
  Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryStyle {
  Passed,
  Partial,
  Failed,
}

impl SummaryStyle {
  fn class(&self) -> &'static str {
    match self {
      SummaryStyle::Passed => "passed",
      SummaryStyle::Partial => "partial",
      SummaryStyle::Failed => "failed",
    }
  }

  fn icon(&self) -> &'static str {
    match self {
      SummaryStyle::Passed => "✅",
      SummaryStyle::Partial => "⚠️",
      SummaryStyle::Failed => "❌",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestSummary {
  pub passed: usize,
  pub total: usize,
  pub style: SummaryStyle,
}

impl TestSummary {
  /// The server's `all_passed` decides the passed style; zero passes is failed.
  pub fn new(results: &[TestResult], server_all_passed: bool) -> Self {
    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    let style = if server_all_passed {
      SummaryStyle::Passed
    } else if passed == 0 {
      SummaryStyle::Failed
    } else {
      SummaryStyle::Partial
    };
    Self { passed, total, style }
  }

  pub fn text(&self) -> String {
    match self.style {
      SummaryStyle::Passed => format!("{0}/{0} tests passed", self.total),
      SummaryStyle::Failed => format!("{0}/{0} tests failed", self.total),
      SummaryStyle::Partial => format!("{}/{} tests passed", self.passed, self.total),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
  Execute,
  RunTests,
}

impl Action {
  fn failure_title(&self) -> &'static str {
    match self {
      Action::Execute => "❌ Error Executing Code",
      Action::RunTests => "❌ Error Running Tests",
    }
  }
}

/// What the results panel shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultsPanel {
  Placeholder,
  Pending(Action),
  SyntaxError(String),
  /// Execute results; a non-empty `errors` is a partial failure.
  Executed { errors: Vec<ExecutionError>, results: Vec<TestResult> },
  ExecuteError(String),
  NoOutput,
  TestRun {
    errors: Vec<ExecutionError>,
    results: Vec<TestResult>,
    summary: Option<TestSummary>,
    /// New success count after a confirmed full pass.
    celebration: Option<u64>,
  },
  NoTestResults,
  Rejected(RunRejection),
  ServerError { action: Action, message: String },
}

/// Result of one submission action.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
  pub token: u64,
  pub state: SubmissionState,
  pub panel: ResultsPanel,
  /// False when a newer submission had already been issued and this
  /// outcome was not written to the session.
  pub applied: bool,
}

impl Submission {
  fn idle() -> Self {
    Self { token: 0, state: SubmissionState::Idle, panel: ResultsPanel::Placeholder, applied: false }
  }
}

/// Which buttons are usable right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
  pub run: bool,
  pub execute: bool,
  pub hint: bool,
  pub reset: bool,
}

#[derive(Clone)]
pub struct SubmissionController {
  api: ApiClient,
  catalog: CatalogClient,
  session: Arc<Session>,
  progress: Progress,
  discard_stale: bool,
  report_progress: bool,
}

impl SubmissionController {
  pub fn new(
    api: ApiClient,
    session: Arc<Session>,
    progress: Progress,
    discard_stale: bool,
    report_progress: bool,
  ) -> Self {
    let catalog = CatalogClient::new(api.clone());
    Self { api, catalog, session, progress, discard_stale, report_progress }
  }

  /// Syntax check, then execution of the current code.
  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn compile_and_execute(&self) -> Submission {
    let Some(question) = self.session.current_question().await else {
      debug!(target: "submission", "Execute ignored: no question selected");
      return Submission::idle();
    };
    let code = self.session.code().await;
    let token = self.begin(Action::Execute).await;
    let (state, panel) = self.execute_round(&question, &code).await;
    self.finish(token, &question.id, state, panel).await
  }

  /// Runs the question's test cases against the current code.
  #[instrument(level = "info", skip(self), fields(session = %self.session.id))]
  pub async fn run_tests(&self) -> Submission {
    let Some(question) = self.session.current_question().await else {
      debug!(target: "submission", "Run ignored: no question selected");
      return Submission::idle();
    };
    let code = self.session.code().await;
    let token = self.begin(Action::RunTests).await;
    let (state, panel) = self.run_round(&question, &code).await;
    self.finish(token, &question.id, state, panel).await
  }

  async fn begin(&self, action: Action) -> u64 {
    let token = self.session.next_token();
    *self.session.results.write().await = ResultsPanel::Pending(action);
    debug!(target: "submission", token, ?action, "Submission started");
    token
  }

  async fn finish(&self, token: u64, question_id: &str, state: SubmissionState, panel: ResultsPanel) -> Submission {
    let mut slot = self.session.results.write().await;
    let moved_on = self.session.current.read().await.as_ref().map_or(true, |q| q.id != question_id);
    let stale = !self.session.is_latest(token);
    if moved_on || (stale && self.discard_stale) {
      info!(
        target: "submission",
        token,
        latest = self.session.latest_token(),
        id = %question_id,
        moved_on,
        ?state,
        "Discarding stale submission outcome"
      );
      return Submission { token, state, panel, applied: false };
    }
    *slot = panel.clone();
    Submission { token, state, panel, applied: true }
  }

  async fn execute_round(&self, question: &Question, code: &str) -> (SubmissionState, ResultsPanel) {
    let body = CodeIn { code, question_id: &question.id };
    match self.compile_then_execute(&body).await {
      Ok(out) => classify_execute(out),
      Err(ClientError::SyntaxError(msg)) => (SubmissionState::Failed, ResultsPanel::SyntaxError(msg)),
      Err(ClientError::RuntimeError(msg)) => (SubmissionState::Failed, ResultsPanel::ExecuteError(msg)),
      Err(e) => {
        warn!(target: "submission", id = %question.id, error = %e, "Execute failed");
        (SubmissionState::ServerError, ResultsPanel::ServerError { action: Action::Execute, message: e.to_string() })
      }
    }
  }

  async fn compile_then_execute(&self, body: &CodeIn<'_>) -> Result<ExecuteOut, ClientError> {
    // The compile endpoint reports syntax errors in the body whatever the status.
    let compiled: CompileOut = self.api.post(&["api", "compile"], body).await?.json()?;
    if !compiled.success {
      let msg = compiled.error.filter(|e| !e.is_empty()).unwrap_or_else(|| "Unknown error".into());
      return Err(ClientError::SyntaxError(msg));
    }
    let reply = self.api.post(&["api", "execute"], body).await?;
    if !reply.is_success() {
      return Err(ClientError::server(
        Some(reply.status),
        format!("Server error: {} - {}", reply.status, reply.snippet(200)),
      ));
    }
    let mut out: ExecuteOut = reply.json()?;
    if out.errors.is_empty() && out.results.is_empty() {
      if let Some(error) = out.error.take().filter(|e| !e.is_empty()) {
        return Err(ClientError::RuntimeError(error));
      }
    }
    Ok(out)
  }

  async fn run_round(&self, question: &Question, code: &str) -> (SubmissionState, ResultsPanel) {
    let server_error = |message: String| {
      warn!(target: "submission", id = %question.id, %message, "Run failed");
      (SubmissionState::ServerError, ResultsPanel::ServerError { action: Action::RunTests, message })
    };

    let body = RunIn { code, test_cases: &question.test_cases, question_id: &question.id };
    let reply = match self.api.post(&["api", "run"], &body).await {
      Ok(reply) => reply,
      Err(e) => return server_error(e.to_string()),
    };

    if !reply.is_success() {
      let rejection = serde_json::from_str::<RunRejection>(&reply.body)
        .unwrap_or_else(|_| RunRejection { error: Some(reply.body.clone()), ..Default::default() });
      let error = rejection.error.as_deref().filter(|e| !e.is_empty());
      if reply.status == 400 && error.is_some() {
        info!(target: "submission", id = %question.id, "Run rejected by server");
        return (SubmissionState::Failed, ResultsPanel::Rejected(rejection));
      }
      return server_error(format!("Server error: {} - {}", reply.status, error.unwrap_or("Unknown error")));
    }

    let outcome: ExecutionOutcome = match reply.json() {
      Ok(outcome) => outcome,
      Err(e) => return server_error(e.to_string()),
    };
    if outcome.derived_all_passed() != outcome.all_passed {
      warn!(
        target: "submission",
        id = %question.id,
        server = outcome.all_passed,
        derived = outcome.derived_all_passed(),
        "Server all_passed disagrees with results; using the server flag"
      );
    }

    let summary = (!outcome.results.is_empty()).then(|| TestSummary::new(&outcome.results, outcome.all_passed));
    if !outcome.errors.is_empty() {
      let panel = ResultsPanel::TestRun { errors: outcome.errors, results: outcome.results, summary, celebration: None };
      return (SubmissionState::PartialFailure, panel);
    }
    if outcome.results.is_empty() {
      return (SubmissionState::Empty, ResultsPanel::NoTestResults);
    }

    let celebration = if outcome.all_passed { Some(self.record_pass(question).await) } else { None };
    let panel = ResultsPanel::TestRun { errors: Vec::new(), results: outcome.results, summary, celebration };
    (SubmissionState::Succeeded, panel)
  }

  /// One confirmed full pass: bump the counter once and refresh the list.
  async fn record_pass(&self, question: &Question) -> u64 {
    let count = self.progress.increment(&question.id);
    info!(target: "submission", id = %question.id, count, "All tests passed");
    self.session.refresh_list(&self.progress).await;
    if self.report_progress {
      let fields = json!({ "solved": true, "success_count": count });
      if let Err(e) = self.catalog.report_progress(&question.id, &fields).await {
        warn!(target: "submission", id = %question.id, error = %e, "Progress report failed");
      }
    }
    count
  }

  /// Reloads the current question's template into the code buffer.
  pub async fn reset_code(&self) -> bool {
    let Some(question) = self.session.current_question().await else { return false };
    self.session.set_code(question.template.clone()).await;
    true
  }

  /// Resets the panel and invalidates every outstanding submission.
  pub async fn clear_results(&self) {
    let mut slot = self.session.results.write().await;
    self.session.next_token();
    *slot = ResultsPanel::Placeholder;
  }

  pub async fn controls(&self) -> Controls {
    let selected = self.session.current.read().await.is_some();
    let has_code = !self.session.code.read().await.trim().is_empty();
    Controls { run: selected && has_code, execute: selected && has_code, hint: selected, reset: selected }
  }
}

fn classify_execute(out: ExecuteOut) -> (SubmissionState, ResultsPanel) {
  if !out.errors.is_empty() {
    (SubmissionState::PartialFailure, ResultsPanel::Executed { errors: out.errors, results: out.results })
  } else if !out.results.is_empty() {
    (SubmissionState::Succeeded, ResultsPanel::Executed { errors: Vec::new(), results: out.results })
  } else {
    (SubmissionState::Empty, ResultsPanel::NoOutput)
  }
}

/// Plain-text form of one test case, for the clipboard.
pub fn copy_text(result: &TestResult) -> String {
  let mut lines = vec![format!("Input:\n{}", json_display(&result.input, true))];
  if let Some(expected) = result.expected.as_ref().filter(|v| !v.is_null()) {
    lines.push(format!("Expected:\n{}", json_display(expected, true)));
  }
  lines.push(format!("Got:\n{}", json_display(&result.output, true)));
  if let Some(error) = &result.error {
    lines.push(format!("Error:\n{error}"));
  }
  if let Some(console) = result.console() {
    lines.push(format!("📄 Console Output:\n{}", console.trim_end()));
  }
  lines.join("\n")
}

fn console_block(result: &TestResult) -> Option<Node> {
  result.console().map(|out| {
    el("div")
      .class("console-output")
      .child(el("strong").text("📄 Console Output:"))
      .child(el("pre").text(out.to_string()))
      .into()
  })
}

fn error_message(title: String, body: impl Into<String>) -> Node {
  el("div")
    .class("error-message")
    .child(el("strong").text(title))
    .child(el("pre").text(body.into()))
    .into()
}

fn execution_result(result: &TestResult) -> Node {
  let mut details = el("div")
    .class("test-result-details")
    .child(el("strong").text("Input: "))
    .text(json_display(&result.input, false))
    .child(el("br"))
    .child(el("strong").text("Output: "))
    .child(el("code").text(json_display(&result.output, false)));
  if let Some(expected) = result.expected.as_ref().filter(|v| !v.is_null()) {
    details = details.child(el("br")).child(el("strong").text("Expected: ")).text(json_display(expected, false));
  }
  if let Some(console) = console_block(result) {
    details = details.child(console);
  }
  el("div")
    .class("test-result passed")
    .child(el("div").class("test-result-header").text("✅ Execution Result"))
    .child(details)
    .into()
}

fn test_result(result: &TestResult) -> Node {
  let (class, icon, status) =
    if result.passed { ("test-result passed", "✅", "Passed") } else { ("test-result failed", "❌", "Failed") };
  let field = |label: &str, value: String| -> Node {
    el("div").child(el("strong").text(format!("{label}:"))).child(el("br")).child(el("code").text(value)).into()
  };
  let mut details = el("div").class("test-result-details").child(field("Input", json_display(&result.input, true)));
  if let Some(expected) = result.expected.as_ref().filter(|v| !v.is_null()) {
    details = details.child(field("Expected", json_display(expected, true)));
  }
  details = details.child(field("Got", json_display(&result.output, true)));
  if let Some(error) = &result.error {
    details = details.child(error_message("Error:".into(), error.clone()));
  }
  if let Some(console) = console_block(result) {
    details = details.child(console);
  }
  el("div")
    .class(class)
    .attr("data-test-case", result.case_label())
    .child(
      el("div")
        .class("test-result-header")
        .text(format!("{icon} Test Case {}: {status}", result.case_label())),
    )
    .child(details)
    .into()
}

impl ResultsPanel {
  pub fn render(&self) -> Node {
    match self {
      ResultsPanel::Placeholder => el("p").class("placeholder").text("Run your code to see test results here.").into(),
      ResultsPanel::Pending(Action::Execute) => el("div").class("loading").text("⚡ Executing code... Please wait.").into(),
      ResultsPanel::Pending(Action::RunTests) => el("div").class("loading").text("🔄 Running tests... Please wait.").into(),
      ResultsPanel::SyntaxError(msg) => error_message("❌ Syntax Error:".into(), msg.clone()),
      ResultsPanel::Executed { errors, results } => {
        let mut nodes: Vec<Node> = errors.iter().map(|e| error_message("Runtime Error:".into(), e.message())).collect();
        if errors.is_empty() {
          nodes.push(el("div").class("execution-success").child(el("strong").text("✅ Code executed successfully!")).into());
        }
        nodes.extend(results.iter().map(execution_result));
        fragment(nodes)
      }
      ResultsPanel::ExecuteError(msg) => el("div")
        .class("error-message")
        .child(el("strong").text("Error:"))
        .child(el("br"))
        .text(msg.clone())
        .into(),
      ResultsPanel::NoOutput => el("div").class("placeholder").text("Code executed but no output.").into(),
      ResultsPanel::TestRun { errors, results, summary, celebration } => {
        let mut nodes: Vec<Node> = errors
          .iter()
          .map(|e| {
            let label = e.case_label().unwrap_or_else(|| "Error".into());
            error_message(format!("❌ Test Case {label}:"), e.message())
          })
          .collect();
        if let Some(summary) = summary {
          nodes.push(
            el("div")
              .class(format!("test-summary {}", summary.style.class()))
              .text(format!("{} {}", summary.style.icon(), summary.text()))
              .into(),
          );
        }
        nodes.extend(results.iter().map(test_result));
        if let Some(count) = celebration {
          let mut banner = el("div").class("celebration").text("🎉 All tests passed! Great job!");
          if *count > 1 {
            banner = banner.child(el("br")).child(el("small").text(format!("✅ Solved successfully {}!", times(*count))));
          }
          nodes.push(banner.into());
        }
        fragment(nodes)
      }
      ResultsPanel::NoTestResults => el("div")
        .class("placeholder")
        .text("No test results available. Check that test cases are configured for this question.")
        .into(),
      ResultsPanel::Rejected(rejection) => {
        let mut msg = el("div")
          .class("error-message")
          .child(el("strong").text("❌ Cannot Run Tests"))
          .child(el("br"))
          .text(rejection.error.clone().unwrap_or_default());
        if let Some(details) = &rejection.details {
          msg = msg.child(el("br")).child(el("small").text(details.clone()));
        }
        if let Some(suggestion) = &rejection.suggestion {
          msg = msg.child(el("br")).child(el("strong").text("💡 Suggestion: ")).text(suggestion.clone());
        }
        msg.into()
      }
      ResultsPanel::ServerError { action, message } => el("div")
        .class("error-message")
        .child(el("strong").text(action.failure_title()))
        .child(el("br"))
        .text(message.clone())
        .child(el("br"))
        .child(el("small").text("Please check your code for syntax errors and try again."))
        .into(),
    }
  }

  pub fn summary(&self) -> Option<&TestSummary> {
    match self {
      ResultsPanel::TestRun { summary, .. } => summary.as_ref(),
      _ => None,
    }
  }
}
