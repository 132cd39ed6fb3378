//! Structured formatting of the markdown-like text returned by the hint and
//! solution endpoints. Output is data, never markup: `render_*` builds
//! escaped `view::Node`s from it.

use std::sync::OnceLock;

use regex::Regex;

use crate::view::{el, fragment, text, Node};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
  Text(String),
  Strong(String),
  Code(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
  Paragraph(Vec<Inline>),
  ListItem(Vec<Inline>),
  Code { language: Option<String>, code: String },
}

/// A blank-line separated part of a solution explanation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
  Steps { intro: Vec<Inline>, steps: Vec<Vec<Inline>> },
  Insight(Vec<Inline>),
  Paragraph(Vec<Inline>),
}

const STEPS_MARKER: &str = "**Algorithm Steps:**";
const INSIGHT_MARKER: &str = "**Key Insight:**";

fn inline_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*|`([^`]+)`").expect("inline pattern is valid"))
}

fn fence_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)```([A-Za-z0-9_+#-]*)[ \t]*\n?(.*?)```").expect("fence pattern is valid"))
}

fn numbered_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^\d+\.\s+").expect("numbered pattern is valid"))
}

/// `**bold**` and `` `code` `` spans; everything else is plain text.
pub fn parse_inline(s: &str) -> Vec<Inline> {
  let mut out = Vec::new();
  let mut last = 0;
  for caps in inline_re().captures_iter(s) {
    let Some(whole) = caps.get(0) else { continue };
    if whole.start() > last {
      out.push(Inline::Text(s[last..whole.start()].to_string()));
    }
    if let Some(bold) = caps.get(1) {
      out.push(Inline::Strong(bold.as_str().to_string()));
    } else if let Some(code) = caps.get(2) {
      out.push(Inline::Code(code.as_str().to_string()));
    }
    last = whole.end();
  }
  if last < s.len() {
    out.push(Inline::Text(s[last..].to_string()));
  }
  out
}

fn line_blocks(chunk: &str, out: &mut Vec<Block>) {
  for line in chunk.lines() {
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("• ")) {
      out.push(Block::ListItem(parse_inline(rest)));
    } else if let Some(m) = numbered_re().find(trimmed) {
      out.push(Block::ListItem(parse_inline(&trimmed[m.end()..])));
    } else {
      out.push(Block::Paragraph(parse_inline(trimmed)));
    }
  }
}

/// Hint text → blocks: fenced code, bullet/numbered items, paragraphs.
pub fn format_hint(hint: &str) -> Vec<Block> {
  let mut out = Vec::new();
  let mut last = 0;
  for caps in fence_re().captures_iter(hint) {
    let Some(whole) = caps.get(0) else { continue };
    line_blocks(&hint[last..whole.start()], &mut out);
    let language = caps
      .get(1)
      .map(|m| m.as_str().to_string())
      .filter(|l| !l.is_empty());
    let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    out.push(Block::Code { language, code: code.trim_end_matches('\n').to_string() });
    last = whole.end();
  }
  line_blocks(&hint[last..], &mut out);
  out
}

/// Solution explanation → sections, split on blank lines.
pub fn format_explanation(explanation: &str) -> Vec<Section> {
  let normalized = explanation.replace("\r\n", "\n");
  let mut out = Vec::new();
  for part in normalized.split("\n\n") {
    let part = part.trim();
    if part.is_empty() {
      continue;
    }
    if part.contains(STEPS_MARKER) {
      let body = part.replace(STEPS_MARKER, "");
      let mut intro = Vec::new();
      let mut steps = Vec::new();
      for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match numbered_re().find(line) {
          Some(m) => steps.push(parse_inline(&line[m.end()..])),
          None => intro.push(line),
        }
      }
      out.push(Section::Steps { intro: parse_inline(&intro.join(" ")), steps });
    } else if part.contains(INSIGHT_MARKER) {
      let body = part.replace(INSIGHT_MARKER, "");
      out.push(Section::Insight(parse_inline(body.trim())));
    } else {
      out.push(Section::Paragraph(parse_inline(part)));
    }
  }
  out
}

pub fn render_inline(spans: &[Inline]) -> Vec<Node> {
  spans
    .iter()
    .map(|span| match span {
      Inline::Text(s) => text(s.clone()),
      Inline::Strong(s) => el("strong").text(s.clone()).into(),
      Inline::Code(s) => el("code").text(s.clone()).into(),
    })
    .collect()
}

/// Consecutive list items are grouped into one `<ul>`.
pub fn render_blocks(blocks: &[Block]) -> Node {
  let mut nodes = Vec::new();
  let mut list: Vec<Node> = Vec::new();
  for block in blocks {
    if let Block::ListItem(spans) = block {
      list.push(el("li").children(render_inline(spans)).into());
      continue;
    }
    if !list.is_empty() {
      nodes.push(el("ul").children(std::mem::take(&mut list)).into());
    }
    match block {
      Block::Paragraph(spans) => nodes.push(el("p").children(render_inline(spans)).into()),
      Block::Code { language, code } => {
        let mut code_el = el("code");
        if let Some(lang) = language {
          code_el = code_el.class(format!("language-{lang}"));
        }
        nodes.push(el("pre").child(code_el.text(code.clone())).into());
      }
      Block::ListItem(_) => {}
    }
  }
  if !list.is_empty() {
    nodes.push(el("ul").children(list).into());
  }
  fragment(nodes)
}

pub fn render_sections(sections: &[Section]) -> Node {
  fragment(sections.iter().map(|section| -> Node {
    match section {
      Section::Steps { intro, steps } => el("div")
        .class("explanation-section")
        .child(el("strong").text("Algorithm Steps:"))
        .child(el("p").children(render_inline(intro)))
        .children(steps.iter().enumerate().map(|(i, step)| -> Node {
          el("div")
            .class("step-item")
            .text(format!("{}. ", i + 1))
            .children(render_inline(step))
            .into()
        }))
        .into(),
      Section::Insight(spans) => el("div")
        .class("explanation-section insight-section")
        .child(el("strong").text("Key Insight: "))
        .children(render_inline(spans))
        .into(),
      Section::Paragraph(spans) => el("p").children(render_inline(spans)).into(),
    }
  }))
}
