//! Small utility helpers used across modules.

/// First `max` characters of `s` (not bytes, so multi-byte text is never split).
pub fn truncate_chars(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    Some((idx, _)) => s[..idx].to_string(),
    None => s.to_string(),
  }
}

/// "1 time", "3 times".
pub fn times(n: u64) -> String {
  if n == 1 { "1 time".into() } else { format!("{n} times") }
}

/// Compact JSON for inline display; pretty JSON when `pretty` is set.
pub fn json_display(v: &serde_json::Value, pretty: bool) -> String {
  let rendered = if pretty { serde_json::to_string_pretty(v) } else { serde_json::to_string(v) };
  rendered.unwrap_or_else(|_| v.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncation_counts_characters() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
  }

  #[test]
  fn pluralizes_counts() {
    assert_eq!(times(1), "1 time");
    assert_eq!(times(4), "4 times");
  }
}
