#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use practice_client::{store::MemoryStore, ClientConfig, Workbench};
use serde_json::{json, Value};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}")
}

pub fn config(base_url: &str) -> ClientConfig {
  ClientConfig {
    base_url: base_url.to_string(),
    hint_timeout: Duration::from_secs(2),
    hint_slow_notice: Duration::from_millis(500),
    connect_timeout: Duration::from_secs(2),
    ..ClientConfig::default()
  }
}

pub fn bench(config: ClientConfig) -> Workbench {
  Workbench::new(config, Arc::new(MemoryStore::new())).unwrap()
}

pub fn catalog() -> Value {
  json!({
    "two-sum": {
      "id": "two-sum",
      "title": "Two Sum",
      "difficulty": "Easy",
      "category": "Arrays",
      "description": "Find two numbers that add up to target.",
      "examples": [{"input": {"nums": [2, 7, 11, 15], "target": 9}, "output": [0, 1]}],
      "constraints": ["2 <= nums.length"],
      "template": "def two_sum(nums, target):\n    pass\n",
      "test_cases": [{"input": {"nums": [2, 7], "target": 9}, "expected": [0, 1]}]
    },
    "lru-cache": {
      "id": "lru-cache",
      "title": "LRU Cache",
      "difficulty": "Medium",
      "category": "Design",
      "template": "class LRUCache:\n    pass\n",
      "test_cases": []
    },
    "word-ladder": {
      "id": "word-ladder",
      "title": "word Ladder",
      "difficulty": "hard",
      "category": "Graphs",
      "template": ""
    }
  })
}

/// `/api/questions` and `/api/questions/:id` over `catalog()`.
pub fn catalog_router() -> Router {
  Router::new()
    .route("/api/questions", get(|| async { Json(catalog()) }))
    .route(
      "/api/questions/:id",
      get(|Path(id): Path<String>| async move {
        match catalog().get(&id) {
          Some(q) => Json(q.clone()).into_response(),
          None => (StatusCode::NOT_FOUND, Json(json!({"error": "Question not found"}))).into_response(),
        }
      }),
    )
}
