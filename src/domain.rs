//! Domain models: questions, difficulties, hint kinds and test-run outcomes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Question difficulty. Labels outside the three known levels are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  Other(String),
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Other(String::new()) }
}

impl Difficulty {
  /// Display label, "Unknown" when the record had none.
  pub fn label(&self) -> &str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
      Difficulty::Other(s) if s.trim().is_empty() => "Unknown",
      Difficulty::Other(s) => s,
    }
  }

  /// Lowercase form used for filtering and badge classes.
  pub fn key(&self) -> String {
    self.label().to_lowercase()
  }
}

impl From<String> for Difficulty {
  fn from(s: String) -> Self {
    match s.trim().to_lowercase().as_str() {
      "easy" => Difficulty::Easy,
      "medium" => Difficulty::Medium,
      "hard" => Difficulty::Hard,
      _ => Difficulty::Other(s),
    }
  }
}

impl From<Option<String>> for Difficulty {
  fn from(s: Option<String>) -> Self {
    s.map(Difficulty::from).unwrap_or_default()
  }
}

impl From<Difficulty> for String {
  fn from(d: Difficulty) -> Self {
    match d {
      Difficulty::Other(s) => s,
      known => known.label().to_string(),
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
  #[serde(default)] pub input: Value,
  #[serde(default)] pub output: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub explanation: Option<String>,
}

/// A practice question as served by `/api/questions`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
  #[serde(default, deserialize_with = "null_as_default")] pub id: String,
  #[serde(default, deserialize_with = "null_as_default")] pub title: String,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default, deserialize_with = "null_as_default")] pub category: String,
  #[serde(default, deserialize_with = "null_as_default")] pub description: String,
  #[serde(default, deserialize_with = "null_as_default")] pub examples: Vec<Example>,
  #[serde(default, deserialize_with = "null_as_default")] pub constraints: Vec<String>,
  /// Starter code loaded into the editor on selection.
  #[serde(default, deserialize_with = "null_as_default")] pub template: String,
  /// Opaque to the client; forwarded as-is to the test runner.
  #[serde(default, deserialize_with = "null_as_default")] pub test_cases: Vec<Value>,
}

/// Explicit `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

impl Question {
  pub fn display_title(&self) -> &str {
    if !self.title.trim().is_empty() {
      &self.title
    } else if !self.id.is_empty() {
      &self.id
    } else {
      "Untitled"
    }
  }

  pub fn display_category(&self) -> &str {
    if self.category.trim().is_empty() { "Uncategorized" } else { &self.category }
  }
}

/// What kind of hint the user asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
  #[default]
  General,
  Specific,
  NextStep,
}

impl HintType {
  pub fn as_str(&self) -> &'static str {
    match self {
      HintType::General => "general",
      HintType::Specific => "specific",
      HintType::NextStep => "next_step",
    }
  }
}

impl std::str::FromStr for HintType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
      "general" => Ok(HintType::General),
      "specific" => Ok(HintType::Specific),
      "next_step" => Ok(HintType::NextStep),
      other => Err(format!("unknown hint type '{other}' (expected general, specific or next_step)")),
    }
  }
}

/// Outcome of one test case. Produced per run, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
  /// Case identifier; the server sends numbers or strings.
  #[serde(default)] pub test_case: Option<Value>,
  #[serde(default)] pub input: Value,
  #[serde(default)] pub expected: Option<Value>,
  #[serde(default)] pub output: Value,
  #[serde(default)] pub passed: bool,
  #[serde(default)] pub error: Option<String>,
  #[serde(default)] pub console_output: Option<String>,
}

impl TestResult {
  pub fn case_label(&self) -> String {
    case_label(self.test_case.as_ref())
  }

  /// Console output with surrounding whitespace, `None` when blank.
  pub fn console(&self) -> Option<&str> {
    self.console_output.as_deref().filter(|s| !s.trim().is_empty())
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
  #[serde(default)] pub test_case: Option<Value>,
  #[serde(default)] pub error: Option<String>,
}

impl ExecutionError {
  pub fn message(&self) -> &str {
    self.error.as_deref().unwrap_or("Unknown error")
  }

  pub fn case_label(&self) -> Option<String> {
    self.test_case.as_ref().filter(|v| !v.is_null()).map(|v| case_label(Some(v)))
  }
}

/// Result set of one execute or run-tests submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
  #[serde(default)] pub results: Vec<TestResult>,
  #[serde(default)] pub errors: Vec<ExecutionError>,
  /// Asserted by the server.
  #[serde(default)] pub all_passed: bool,
}

impl ExecutionOutcome {
  pub fn passed_count(&self) -> usize {
    self.results.iter().filter(|r| r.passed).count()
  }

  /// Client-side derivation of a full pass.
  pub fn derived_all_passed(&self) -> bool {
    self.errors.is_empty() && !self.results.is_empty() && self.results.iter().all(|r| r.passed)
  }
}

fn case_label(v: Option<&Value>) -> String {
  match v {
    None | Some(Value::Null) => "?".to_string(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}
