mod common;

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  time::Duration,
};

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use practice_client::{
  submission::{ResultsPanel, SubmissionState, SummaryStyle},
  Workbench,
};
use serde_json::{json, Value};

fn run_router(response: Value, status: StatusCode) -> Router {
  common::catalog_router().route(
    "/api/run",
    post(move || {
      let response = response.clone();
      async move { (status, Json(response)) }
    }),
  )
}

async fn ready(router: Router) -> Workbench {
  let base = common::spawn(router).await;
  let bench = common::bench(common::config(&base));
  bench.load_questions().await.unwrap();
  bench.select_question("two-sum").await.unwrap();
  bench
}

fn badge_count(bench_list: &practice_client::listing::ListView, id: &str) -> u64 {
  bench_list.entries().iter().find(|e| e.id == id).map(|e| e.success_count).unwrap()
}

#[tokio::test]
async fn full_pass_increments_once_and_refreshes_badges() {
  let bench = ready(run_router(
    json!({"results": [{"test_case": 1, "passed": true}, {"test_case": 2, "passed": true}], "errors": [], "all_passed": true}),
    StatusCode::OK,
  ))
  .await;

  let first = bench.submissions().run_tests().await;
  assert_eq!(first.state, SubmissionState::Succeeded);
  assert!(first.applied);
  let summary = first.panel.summary().unwrap();
  assert_eq!(summary.style, SummaryStyle::Passed);
  assert_eq!(summary.text(), "2/2 tests passed");
  assert_eq!(bench.progress().count("two-sum"), 1);
  assert_eq!(badge_count(&bench.list_view().await, "two-sum"), 1);
  assert!(bench.question_view().await.unwrap().to_text().contains("✓ Solved 1 time"));

  let second = bench.submissions().run_tests().await;
  assert_eq!(bench.progress().count("two-sum"), 2);
  assert!(second.panel.render().to_text().contains("✅ Solved successfully 2 times!"));
  assert_eq!(badge_count(&bench.list_view().await, "two-sum"), 2);
}

#[tokio::test]
async fn full_pass_reports_progress_when_enabled() {
  let reported: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
  let sink = reported.clone();
  let router = run_router(
    json!({"results": [{"test_case": 1, "passed": true}], "errors": [], "all_passed": true}),
    StatusCode::OK,
  )
  .route(
    "/api/questions/:id/progress",
    post(move |Path(id): Path<String>, Json(body): Json<Value>| {
      sink.lock().unwrap().push((id, body));
      async { Json(json!({"ok": true})) }
    }),
  );
  let base = common::spawn(router).await;
  let mut config = common::config(&base);
  config.report_progress = true;
  let bench = common::bench(config);
  bench.select_question("two-sum").await.unwrap();

  bench.submissions().run_tests().await;
  let reported = reported.lock().unwrap().clone();
  assert_eq!(reported, [("two-sum".to_string(), json!({"solved": true, "success_count": 1}))]);
}

#[tokio::test]
async fn partial_pass_does_not_increment() {
  let bench = ready(run_router(
    json!({"results": [{"test_case": 1, "passed": true}, {"test_case": 2, "passed": false}], "errors": []}),
    StatusCode::OK,
  ))
  .await;

  let outcome = bench.submissions().run_tests().await;
  let summary = outcome.panel.summary().unwrap();
  assert_eq!((summary.style, summary.passed, summary.total), (SummaryStyle::Partial, 1, 2));
  assert_eq!(summary.text(), "1/2 tests passed");
  assert_eq!(bench.progress().count("two-sum"), 0);
}

#[tokio::test]
async fn client_derived_pass_without_server_flag_does_not_increment() {
  let bench = ready(run_router(
    json!({"results": [{"test_case": 1, "passed": true}], "errors": [], "all_passed": false}),
    StatusCode::OK,
  ))
  .await;

  let outcome = bench.submissions().run_tests().await;
  assert_eq!(outcome.panel.summary().unwrap().style, SummaryStyle::Partial);
  assert_eq!(bench.progress().count("two-sum"), 0);
}

#[tokio::test]
async fn errors_branch_is_partial_failure_without_increment() {
  let bench = ready(run_router(
    json!({
      "results": [{"test_case": 1, "passed": true}],
      "errors": [{"test_case": 2, "error": "IndexError: list index out of range"}],
      "all_passed": true
    }),
    StatusCode::OK,
  ))
  .await;

  let outcome = bench.submissions().run_tests().await;
  assert_eq!(outcome.state, SubmissionState::PartialFailure);
  let text = outcome.panel.render().to_text();
  assert!(text.contains("❌ Test Case 2:"));
  assert!(text.contains("IndexError: list index out of range"));
  assert_eq!(bench.progress().count("two-sum"), 0);
}

#[tokio::test]
async fn structured_rejection_renders_without_increment() {
  let bench = ready(run_router(
    json!({"error": "Missing test cases", "suggestion": "Add test cases"}),
    StatusCode::BAD_REQUEST,
  ))
  .await;

  let outcome = bench.submissions().run_tests().await;
  assert_eq!(outcome.state, SubmissionState::Failed);
  assert!(matches!(outcome.panel, ResultsPanel::Rejected(_)));
  let text = outcome.panel.render().to_text();
  assert!(text.contains("Missing test cases"));
  assert!(text.contains("Add test cases"));
  assert!(bench.progress().all_counts().is_empty());
}

#[tokio::test]
async fn other_statuses_are_server_errors() {
  let router = common::catalog_router()
    .route("/api/run", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }));
  let bench = ready(router).await;

  let outcome = bench.submissions().run_tests().await;
  assert_eq!(outcome.state, SubmissionState::ServerError);
  match &outcome.panel {
    ResultsPanel::ServerError { message, .. } => assert_eq!(message, "Server error: 500 - upstream exploded"),
    other => panic!("unexpected panel {other:?}"),
  }
}

#[tokio::test]
async fn empty_run_is_neutral() {
  let bench = ready(run_router(json!({"results": [], "errors": []}), StatusCode::OK)).await;
  let outcome = bench.submissions().run_tests().await;
  assert_eq!((outcome.state, outcome.panel), (SubmissionState::Empty, ResultsPanel::NoTestResults));
}

#[tokio::test]
async fn syntax_error_skips_execution() {
  let executed = Arc::new(AtomicUsize::new(0));
  let hits = executed.clone();
  let router = common::catalog_router()
    .route(
      "/api/compile",
      post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"success": false, "error": "invalid syntax (line 1)"}))) }),
    )
    .route(
      "/api/execute",
      post(move || {
        hits.fetch_add(1, Ordering::SeqCst);
        async { Json(json!({"results": []})) }
      }),
    );
  let bench = ready(router).await;

  let outcome = bench.submissions().compile_and_execute().await;
  assert_eq!(outcome.state, SubmissionState::Failed);
  assert_eq!(outcome.panel, ResultsPanel::SyntaxError("invalid syntax (line 1)".into()));
  assert_eq!(executed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn execute_results_and_server_errors() {
  let router = common::catalog_router()
    .route("/api/compile", post(|| async { Json(json!({"success": true})) }))
    .route(
      "/api/execute",
      post(|Json(body): Json<Value>| async move {
        let code = body["code"].as_str().unwrap_or_default();
        if code.contains("crash") {
          return (StatusCode::BAD_GATEWAY, "x".repeat(500)).into_response();
        }
        if code.contains("undefined") {
          return Json(json!({"error": "NameError: name 'y' is not defined"})).into_response();
        }
        Json(json!({"results": [{"input": [1], "output": 2, "console_output": "dbg"}]})).into_response()
      }),
    );
  let bench = ready(router).await;

  let ok = bench.submissions().compile_and_execute().await;
  assert_eq!(ok.state, SubmissionState::Succeeded);
  let text = ok.panel.render().to_text();
  assert!(text.contains("✅ Code executed successfully!"));
  assert!(text.contains("📄 Console Output:"));

  bench.set_code("print(undefined)").await;
  let runtime = bench.submissions().compile_and_execute().await;
  assert_eq!(runtime.state, SubmissionState::Failed);
  assert_eq!(runtime.panel, ResultsPanel::ExecuteError("NameError: name 'y' is not defined".into()));

  bench.set_code("crash()").await;
  let failed = bench.submissions().compile_and_execute().await;
  assert_eq!(failed.state, SubmissionState::ServerError);
  match failed.panel {
    ResultsPanel::ServerError { message, .. } => assert_eq!(message, format!("Server error: 502 - {}", "x".repeat(200))),
    other => panic!("unexpected panel {other:?}"),
  }
}

#[tokio::test]
async fn no_selection_is_idle() {
  let base = common::spawn(common::catalog_router()).await;
  let bench = common::bench(common::config(&base));
  let outcome = bench.submissions().run_tests().await;
  assert_eq!(outcome.state, SubmissionState::Idle);
  assert!(!outcome.applied);
  let controls = bench.submissions().controls().await;
  assert!(!controls.run && !controls.hint);
}

#[tokio::test]
async fn reset_and_clear() {
  let bench = ready(run_router(json!({"results": [], "errors": []}), StatusCode::OK)).await;
  bench.set_code("   ").await;
  assert!(!bench.submissions().controls().await.run);
  assert!(bench.submissions().reset_code().await);
  assert_eq!(bench.session().code().await, "def two_sum(nums, target):\n    pass\n");

  bench.submissions().run_tests().await;
  bench.submissions().clear_results().await;
  assert_eq!(*bench.session().results.read().await, ResultsPanel::Placeholder);
}

/// `/api/run` answers slowly for code containing "slow" so a later
/// submission can overtake an earlier one.
fn racing_router() -> Router {
  common::catalog_router().route(
    "/api/run",
    post(|Json(body): Json<Value>| async move {
      let slow = body["code"].as_str().unwrap_or_default().contains("slow");
      if slow {
        tokio::time::sleep(Duration::from_millis(400)).await;
        return Json(json!({"results": [{"test_case": "slow", "passed": false}], "errors": []}));
      }
      Json(json!({"results": [{"test_case": "fast", "passed": true}], "errors": [], "all_passed": true}))
    }),
  )
}

async fn race(discard_stale: bool) -> (Workbench, ResultsPanel, bool, ResultsPanel, bool) {
  let base = common::spawn(racing_router()).await;
  let mut config = common::config(&base);
  config.discard_stale_responses = discard_stale;
  let bench = common::bench(config);
  bench.select_question("two-sum").await.unwrap();

  bench.set_code("slow").await;
  let controller = bench.submissions().clone();
  let earlier = tokio::spawn(async move { controller.run_tests().await });
  tokio::time::sleep(Duration::from_millis(100)).await;

  bench.set_code("fast").await;
  let later = bench.submissions().run_tests().await;
  let earlier = earlier.await.unwrap();
  assert!(earlier.token < later.token);
  (bench, earlier.panel, earlier.applied, later.panel, later.applied)
}

#[tokio::test]
async fn stale_response_is_discarded_by_default() {
  let (bench, _earlier, earlier_applied, later, later_applied) = race(true).await;
  assert!(later_applied);
  assert!(!earlier_applied);
  assert_eq!(*bench.session().results.read().await, later);
}

#[tokio::test]
async fn last_response_wins_when_discarding_is_off() {
  let (bench, earlier, earlier_applied, _later, later_applied) = race(false).await;
  assert!(later_applied && earlier_applied);
  assert_eq!(*bench.session().results.read().await, earlier);
}

#[tokio::test]
async fn stale_full_pass_still_counts_but_is_not_shown() {
  let router = common::catalog_router().route(
    "/api/run",
    post(|Json(body): Json<Value>| async move {
      if body["code"].as_str().unwrap_or_default().contains("slow") {
        tokio::time::sleep(Duration::from_millis(400)).await;
        return Json(json!({"results": [{"test_case": 1, "passed": true}], "errors": [], "all_passed": true}));
      }
      Json(json!({"results": [{"test_case": 1, "passed": false}], "errors": [], "all_passed": false}))
    }),
  );
  let bench = ready(router).await;

  bench.set_code("slow").await;
  let controller = bench.submissions().clone();
  let earlier = tokio::spawn(async move { controller.run_tests().await });
  tokio::time::sleep(Duration::from_millis(100)).await;
  bench.set_code("fast").await;
  let later = bench.submissions().run_tests().await;
  let earlier = earlier.await.unwrap();

  assert!(!earlier.applied);
  assert_eq!(earlier.state, SubmissionState::Succeeded);
  assert_eq!(bench.progress().count("two-sum"), 1);
  assert_eq!(*bench.session().results.read().await, later.panel);
  assert_eq!(later.panel.summary().unwrap().style, SummaryStyle::Failed);
}

#[tokio::test]
async fn switching_questions_drops_the_outstanding_run() {
  let router = common::catalog_router().route(
    "/api/run",
    post(|| async {
      tokio::time::sleep(Duration::from_millis(300)).await;
      Json(json!({"results": [{"test_case": 1, "passed": true}], "errors": [], "all_passed": true}))
    }),
  );
  let base = common::spawn(router).await;
  let mut config = common::config(&base);
  // Even last-response-wins never shows another question's outcome.
  config.discard_stale_responses = false;
  let bench = common::bench(config);
  bench.load_questions().await.unwrap();
  bench.select_question("two-sum").await.unwrap();

  let controller = bench.submissions().clone();
  let pending = tokio::spawn(async move { controller.run_tests().await });
  tokio::time::sleep(Duration::from_millis(100)).await;
  bench.select_question("lru-cache").await.unwrap();
  let outcome = pending.await.unwrap();

  assert!(!outcome.applied);
  assert_eq!(*bench.session().results.read().await, ResultsPanel::Placeholder);
  assert_eq!(bench.session().current_question().await.unwrap().id, "lru-cache");
  assert_eq!(bench.progress().count("two-sum"), 1);
  assert!(!bench.question_view().await.unwrap().to_text().contains("Solved"));
}

#[tokio::test]
async fn clearing_results_invalidates_the_outstanding_run() {
  let router = common::catalog_router().route(
    "/api/run",
    post(|| async {
      tokio::time::sleep(Duration::from_millis(300)).await;
      Json(json!({"results": [{"test_case": 1, "passed": false}], "errors": []}))
    }),
  );
  let bench = ready(router).await;

  let controller = bench.submissions().clone();
  let pending = tokio::spawn(async move { controller.run_tests().await });
  tokio::time::sleep(Duration::from_millis(100)).await;
  bench.submissions().clear_results().await;

  assert!(!pending.await.unwrap().applied);
  assert_eq!(*bench.session().results.read().await, ResultsPanel::Placeholder);
}
