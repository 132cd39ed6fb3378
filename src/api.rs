//! Thin HTTP transport to the practice server.
//!
//! Every call returns the raw status and body so each controller can apply
//! its own status policy (some endpoints carry JSON on error statuses).
//! Calls log method, path, status, latency and body size, never contents.

use std::time::Instant;

use reqwest::{
  header::{CACHE_CONTROL, CONTENT_TYPE, USER_AGENT},
  Url,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::util::truncate_chars;

const CLIENT_AGENT: &str = concat!("practice-client/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed exchange.
#[derive(Clone, Debug)]
pub struct Reply {
  pub status: u16,
  pub body: String,
}

impl Reply {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
    serde_json::from_str(&self.body).map_err(|e| {
      ClientError::server(Some(self.status), format!("Invalid JSON from server: {e}"))
    })
  }

  /// First `max` characters of the body, for user-facing error messages.
  pub fn snippet(&self, max: usize) -> String {
    truncate_chars(&self.body, max)
  }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
  client: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| ClientError::Config(format!("invalid base url '{}': {e}", config.base_url)))?;
    if base_url.cannot_be_a_base() {
      return Err(ClientError::Config(format!("base url '{}' cannot carry paths", config.base_url)));
    }
    let client = reqwest::Client::builder()
      .connect_timeout(config.connect_timeout)
      .build()
      .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Base URL extended by path segments; each segment is percent-encoded.
  pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ClientError::Config(format!("base url '{}' cannot carry paths", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  #[instrument(level = "debug", skip(self), fields(path = %segments.join("/")))]
  pub async fn get(&self, segments: &[&str]) -> Result<Reply, ClientError> {
    let url = self.endpoint(segments)?;
    let req = self
      .client
      .get(url)
      .header(USER_AGENT, CLIENT_AGENT)
      .header(CACHE_CONTROL, "no-cache");
    self.exchange("GET", segments, req).await
  }

  #[instrument(level = "debug", skip(self, body), fields(path = %segments.join("/")))]
  pub async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<Reply, ClientError> {
    let url = self.endpoint(segments)?;
    let req = self
      .client
      .post(url)
      .header(USER_AGENT, CLIENT_AGENT)
      .header(CONTENT_TYPE, "application/json")
      .json(body);
    self.exchange("POST", segments, req).await
  }

  async fn exchange(
    &self,
    method: &'static str,
    segments: &[&str],
    req: reqwest::RequestBuilder,
  ) -> Result<Reply, ClientError> {
    let start = Instant::now();
    let res = req.send().await.map_err(|e| {
      warn!(target: "practice_client", %method, path = %segments.join("/"), error = %e, "Request failed");
      ClientError::server(None, format!("Network error: {e}"))
    })?;
    let status = res.status().as_u16();
    let body = res
      .text()
      .await
      .map_err(|e| ClientError::server(Some(status), format!("Failed to read response: {e}")))?;
    debug!(
      target: "practice_client",
      %method,
      path = %segments.join("/"),
      status,
      elapsed = ?start.elapsed(),
      body_len = body.len(),
      "Response received"
    );
    Ok(Reply { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    let config = ClientConfig { base_url: base.to_string(), ..ClientConfig::default() };
    ApiClient::new(&config).unwrap()
  }

  #[test]
  fn endpoint_encodes_segments() {
    let api = client("http://localhost:5000");
    let url = api.endpoint(&["api", "questions", "a b/c"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:5000/api/questions/a%20b%2Fc");
  }

  #[test]
  fn endpoint_keeps_base_path_prefix() {
    let api = client("http://localhost:5000/practice/");
    let url = api.endpoint(&["api", "run"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:5000/practice/api/run");
  }

  #[test]
  fn rejects_unusable_base_urls() {
    for base in ["not a url", "mailto:someone@example.com"] {
      let config = ClientConfig { base_url: base.to_string(), ..ClientConfig::default() };
      assert!(matches!(ApiClient::new(&config), Err(ClientError::Config(_))));
    }
  }

  #[test]
  fn reply_snippet_and_json_errors() {
    let reply = Reply { status: 500, body: "x".repeat(300) };
    assert!(!reply.is_success());
    assert_eq!(reply.snippet(200).chars().count(), 200);
    let err = reply.json::<serde_json::Value>().unwrap_err();
    assert!(matches!(err, ClientError::ServerError { status: Some(500), .. }));
  }
}
