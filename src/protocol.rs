//! Request/response bodies of the practice server's JSON API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ExecutionError, HintType, Question, TestResult};

#[derive(Debug, Serialize)]
pub struct CodeIn<'a> {
  pub code: &'a str,
  pub question_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompileOut {
  #[serde(default)] pub success: bool,
  #[serde(default)] pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteOut {
  #[serde(default)] pub results: Vec<TestResult>,
  #[serde(default)] pub errors: Vec<ExecutionError>,
  #[serde(default)] pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunIn<'a> {
  pub code: &'a str,
  pub test_cases: &'a [Value],
  pub question_id: &'a str,
}

/// Structured rejection returned by `/api/run` with a 4xx status.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RunRejection {
  #[serde(default)] pub error: Option<String>,
  #[serde(default)] pub details: Option<String>,
  #[serde(default)] pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HintIn<'a> {
  pub question: &'a Question,
  pub code: &'a str,
  pub hint_type: HintType,
}

#[derive(Debug, Default, Deserialize)]
pub struct HintOut {
  #[serde(default)] pub hint: Option<String>,
  #[serde(default)] pub rag_available: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SolutionIn<'a> {
  pub question: &'a Question,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SolutionOut {
  #[serde(default)] pub available: bool,
  #[serde(default)] pub solution: Option<String>,
  #[serde(default)] pub approach: Option<String>,
  #[serde(default)] pub time_complexity: Option<String>,
  #[serde(default)] pub space_complexity: Option<String>,
  #[serde(default)] pub explanation: Option<String>,
  #[serde(default)] pub message: Option<String>,
}
