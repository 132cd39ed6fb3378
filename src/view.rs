//! Presentation tree with escaping by default.
//!
//! Tags and attribute names are `&'static str`, so only text content and
//! attribute values ever come from data, and both are escaped on output.
//! View models in the other modules build `Node`s; `to_html` serves a web
//! front-end and `to_text` serves the terminal.

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
  Text(String),
  Element(Element),
  Fragment(Vec<Node>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
  tag: &'static str,
  attrs: Vec<(&'static str, String)>,
  children: Vec<Node>,
}

const VOID_TAGS: &[&str] = &["br", "hr"];
const BLOCK_TAGS: &[&str] = &["div", "p", "li", "ul", "ol", "pre", "h3", "h4", "section", "header"];

pub fn el(tag: &'static str) -> Element {
  Element { tag, attrs: Vec::new(), children: Vec::new() }
}

pub fn text(s: impl Into<String>) -> Node {
  Node::Text(s.into())
}

pub fn fragment(nodes: impl IntoIterator<Item = Node>) -> Node {
  Node::Fragment(nodes.into_iter().collect())
}

/// Escapes `& < > " '` for text and attribute contexts.
pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#039;"),
      c => out.push(c),
    }
  }
  out
}

impl Element {
  pub fn tag(&self) -> &'static str {
    self.tag
  }

  pub fn class(self, class: impl Into<String>) -> Self {
    self.attr("class", class)
  }

  pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
    self.attrs.push((name, value.into()));
    self
  }

  pub fn child(mut self, node: impl Into<Node>) -> Self {
    self.children.push(node.into());
    self
  }

  pub fn text(self, s: impl Into<String>) -> Self {
    self.child(Node::Text(s.into()))
  }

  pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
    self.children.extend(nodes);
    self
  }

  pub fn get_attr(&self, name: &str) -> Option<&str> {
    self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
  }
}

impl From<Element> for Node {
  fn from(e: Element) -> Self {
    Node::Element(e)
  }
}

impl Node {
  pub fn to_html(&self) -> String {
    let mut out = String::new();
    self.write_html(&mut out);
    out
  }

  fn write_html(&self, out: &mut String) {
    match self {
      Node::Text(s) => out.push_str(&escape(s)),
      Node::Fragment(nodes) => nodes.iter().for_each(|n| n.write_html(out)),
      Node::Element(e) => {
        out.push('<');
        out.push_str(e.tag);
        for (name, value) in &e.attrs {
          out.push(' ');
          out.push_str(name);
          out.push_str("=\"");
          out.push_str(&escape(value));
          out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&e.tag) {
          return;
        }
        e.children.iter().for_each(|n| n.write_html(out));
        out.push_str("</");
        out.push_str(e.tag);
        out.push('>');
      }
    }
  }

  /// Plain-text rendering: block elements on their own lines, list items bulleted.
  pub fn to_text(&self) -> String {
    let mut out = String::new();
    self.write_text(&mut out);
    let lines: Vec<&str> = out.lines().map(str::trim_end).collect();
    let mut collapsed: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
      if line.is_empty() && collapsed.last().map_or(true, |l| l.is_empty()) {
        continue;
      }
      collapsed.push(line);
    }
    collapsed.join("\n").trim_end().to_string()
  }

  fn write_text(&self, out: &mut String) {
    match self {
      Node::Text(s) => out.push_str(s),
      Node::Fragment(nodes) => nodes.iter().for_each(|n| n.write_text(out)),
      Node::Element(e) => {
        if e.tag == "br" {
          out.push('\n');
          return;
        }
        let block = BLOCK_TAGS.contains(&e.tag);
        if block && !out.is_empty() && !out.ends_with('\n') {
          out.push('\n');
        }
        if e.tag == "li" {
          out.push_str("  • ");
        }
        e.children.iter().for_each(|n| n.write_text(out));
        if block && !out.ends_with('\n') {
          out.push('\n');
        }
      }
    }
  }

  /// Depth-first search for the first element with `class` among its classes.
  pub fn find_class(&self, class: &str) -> Option<&Element> {
    match self {
      Node::Text(_) => None,
      Node::Fragment(nodes) => nodes.iter().find_map(|n| n.find_class(class)),
      Node::Element(e) => {
        let has = e
          .get_attr("class")
          .map_or(false, |c| c.split_whitespace().any(|c| c == class));
        if has {
          Some(e)
        } else {
          e.children.iter().find_map(|n| n.find_class(class))
        }
      }
    }
  }
}
