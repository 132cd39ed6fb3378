//! Question list projection: filter, sort, annotate with success counts.

use std::{collections::HashMap, fmt, str::FromStr};

use tracing::debug;

use crate::domain::Question;
use crate::util::times;
use crate::view::{el, fragment, Node};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
  #[default]
  All,
  Easy,
  Medium,
  Hard,
}

impl Filter {
  pub fn as_str(&self) -> &'static str {
    match self {
      Filter::All => "all",
      Filter::Easy => "easy",
      Filter::Medium => "medium",
      Filter::Hard => "hard",
    }
  }

  pub fn matches(&self, q: &Question) -> bool {
    match self {
      Filter::All => true,
      level => q.difficulty.key() == level.as_str(),
    }
  }
}

impl FromStr for Filter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "all" => Ok(Filter::All),
      "easy" => Ok(Filter::Easy),
      "medium" => Ok(Filter::Medium),
      "hard" => Ok(Filter::Hard),
      other => Err(format!("unknown filter '{other}' (expected all, easy, medium or hard)")),
    }
  }
}

impl fmt::Display for Filter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
  pub id: String,
  pub title: String,
  pub difficulty: String,
  pub difficulty_key: String,
  pub category: String,
  pub success_count: u64,
  pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ListView {
  #[default]
  Loading,
  Unavailable(String),
  Empty { filter: Filter },
  Entries(Vec<ListEntry>),
}

/// Filtered, title-sorted entries. Records without an id are dropped.
pub fn project<'a>(
  questions: impl IntoIterator<Item = &'a Question>,
  filter: Filter,
  counts: &HashMap<String, u64>,
  active_id: Option<&str>,
) -> ListView {
  let mut keyed: Vec<(String, ListEntry)> = questions
    .into_iter()
    .filter(|q| filter.matches(q))
    .filter(|q| {
      if q.id.is_empty() {
        debug!(target: "catalog", title = %q.title, "Dropping question without id from list");
        return false;
      }
      true
    })
    .map(|q| {
      let entry = ListEntry {
        id: q.id.clone(),
        title: q.display_title().to_string(),
        difficulty: q.difficulty.label().to_string(),
        difficulty_key: q.difficulty.key(),
        category: q.display_category().to_string(),
        success_count: counts.get(&q.id).copied().unwrap_or(0),
        active: active_id == Some(q.id.as_str()),
      };
      // Untitled records sort as "" ahead of everything, even though they display their id.
      (q.title.to_lowercase(), entry)
    })
    .collect();

  if keyed.is_empty() {
    return ListView::Empty { filter };
  }
  // sort_by is stable, so equal titles keep catalog order.
  keyed.sort_by(|a, b| a.0.cmp(&b.0));
  let entries = keyed.into_iter().map(|(_, entry)| entry).collect();
  ListView::Entries(entries)
}

pub fn success_badge(count: u64) -> Option<Node> {
  (count > 0).then(|| {
    el("span")
      .class("success-badge")
      .attr("title", format!("Solved {}", times(count)))
      .text(format!("✓ {count}"))
      .into()
  })
}

impl ListEntry {
  pub fn render(&self) -> Node {
    let class = if self.active { "question-item active" } else { "question-item" };
    let mut title = el("div").class("question-item-title").text(self.title.clone());
    if let Some(badge) = success_badge(self.success_count) {
      title = title.text(" ").child(badge);
    }
    el("div")
      .class(class)
      .attr("data-id", self.id.clone())
      .child(title)
      .child(
        el("div")
          .class("question-item-meta")
          .child(
            el("span")
              .class(format!("badge badge-{}", self.difficulty_key))
              .text(self.difficulty.clone()),
          )
          .text(" · ")
          .child(el("span").text(self.category.clone()))
          .text(" · ")
          .child(el("span").class("question-id").text(self.id.clone())),
      )
      .into()
  }
}

impl ListView {
  pub fn render(&self) -> Node {
    match self {
      ListView::Loading => el("div").class("loading").text("No questions loaded yet...").into(),
      ListView::Unavailable(msg) => el("div")
        .class("loading error")
        .text(format!("Error loading questions: {msg}"))
        .child(el("br"))
        .text("Please refresh the page.")
        .into(),
      ListView::Empty { filter } => {
        el("div").class("loading").text(format!("No {filter} questions found.")).into()
      }
      ListView::Entries(entries) => fragment(entries.iter().map(ListEntry::render)),
    }
  }

  pub fn entries(&self) -> &[ListEntry] {
    match self {
      ListView::Entries(entries) => entries,
      _ => &[],
    }
  }
}

/// Header line of the question panel: title plus "Solved N times" badge.
pub fn question_header(q: &Question, success_count: u64) -> Node {
  let mut title = el("div").class("question-title").text(q.display_title().to_string());
  if success_count > 0 {
    let solved = format!("Solved {}", times(success_count));
    title = title
      .text(" ")
      .child(el("span").class("success-badge").attr("title", solved.clone()).text(format!("✓ {solved}")));
  }
  title.into()
}

/// Full question panel: header, meta, description, examples, constraints.
pub fn question_panel(q: &Question, success_count: u64) -> Node {
  let examples = q.examples.iter().enumerate().map(|(idx, ex)| -> Node {
    let mut code = el("div")
      .class("example-code")
      .child(el("strong").text("Input: "))
      .text(crate::util::json_display(&ex.input, false))
      .child(el("br"))
      .child(el("strong").text("Output: "))
      .text(crate::util::json_display(&ex.output, false));
    if let Some(explanation) = ex.explanation.as_deref().filter(|s| !s.is_empty()) {
      code = code.child(el("br")).child(el("strong").text("Explanation: ")).text(explanation.to_string());
    }
    el("div")
      .class("example")
      .child(el("div").class("example-label").text(format!("Example {}:", idx + 1)))
      .child(code)
      .into()
  });

  let mut panel = el("section")
    .class("question-panel")
    .child(question_header(q, success_count))
    .child(
      el("div")
        .class("question-meta")
        .child(el("span").class(format!("badge badge-{}", q.difficulty.key())).text(q.difficulty.label().to_string()))
        .text(" · ")
        .child(el("span").text(q.display_category().to_string())),
    )
    .child(el("div").class("question-description").text(q.description.clone()));

  if !q.examples.is_empty() {
    panel = panel.child(el("div").class("question-examples").children(examples));
  }
  if !q.constraints.is_empty() {
    panel = panel.child(
      el("div")
        .class("constraints")
        .child(el("h4").text("Constraints:"))
        .child(el("ul").children(q.constraints.iter().map(|c| -> Node { el("li").text(c.clone()).into() }))),
    );
  }
  panel.into()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;

  fn q(id: &str, title: &str, difficulty: Difficulty) -> Question {
    Question { id: id.into(), title: title.into(), difficulty, category: "Arrays".into(), ..Default::default() }
  }

  fn titles(view: &ListView) -> Vec<&str> {
    view.entries().iter().map(|e| e.title.as_str()).collect()
  }

  #[test]
  fn sorts_titles_case_insensitively() {
    let qs = [
      q("b", "Banana", Difficulty::Easy),
      q("a", "apple", Difficulty::Easy),
      q("c", "Cherry", Difficulty::Easy),
    ];
    let view = project(&qs, Filter::All, &HashMap::new(), None);
    assert_eq!(titles(&view), ["apple", "Banana", "Cherry"]);
  }

  #[test]
  fn untitled_entries_sort_first_and_show_their_id() {
    let qs = [q("b", "Banana", Difficulty::Easy), q("zz-untitled", "", Difficulty::Easy), q("a", "apple", Difficulty::Easy)];
    let view = project(&qs, Filter::All, &HashMap::new(), None);
    assert_eq!(titles(&view), ["zz-untitled", "apple", "Banana"]);
  }

  #[test]
  fn equal_titles_keep_catalog_order() {
    let qs = [
      q("second", "same", Difficulty::Easy),
      q("first", "Same", Difficulty::Hard),
      q("third", "SAME", Difficulty::Medium),
    ];
    let view = project(&qs, Filter::All, &HashMap::new(), None);
    let ids: Vec<&str> = view.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["second", "first", "third"]);
  }

  #[test]
  fn filters_by_difficulty_case_insensitively() {
    let qs = [
      q("a", "A", Difficulty::from("medium".to_string())),
      q("b", "B", Difficulty::Hard),
      q("c", "C", Difficulty::from("MEDIUM".to_string())),
      q("d", "D", Difficulty::Other("Weird".into())),
    ];
    let medium = project(&qs, "Medium".parse().unwrap(), &HashMap::new(), None);
    assert_eq!(titles(&medium), ["A", "C"]);
    let all = project(&qs, Filter::All, &HashMap::new(), None);
    assert_eq!(all.entries().len(), 4);
    assert_eq!(project(&qs, Filter::Easy, &HashMap::new(), None), ListView::Empty { filter: Filter::Easy });
  }

  #[test]
  fn drops_entries_without_id() {
    let qs = [q("", "Ghost", Difficulty::Easy), q("real", "Real", Difficulty::Easy)];
    let view = project(&qs, Filter::All, &HashMap::new(), Some("real"));
    assert_eq!(titles(&view), ["Real"]);
    assert!(view.entries()[0].active);
  }

  #[test]
  fn badge_only_when_solved() {
    let qs = [q("a", "A", Difficulty::Easy), q("b", "B", Difficulty::Easy)];
    let counts = HashMap::from([("a".to_string(), 2u64)]);
    let view = project(&qs, Filter::All, &counts, None);
    let rendered: Vec<Node> = view.entries().iter().map(ListEntry::render).collect();
    let badge = rendered[0].find_class("success-badge").unwrap();
    assert_eq!(badge.get_attr("title"), Some("Solved 2 times"));
    assert!(rendered[1].find_class("success-badge").is_none());
  }

  #[test]
  fn title_and_category_markup_is_escaped() {
    let mut evil = q("x", "<script>alert(1)</script>", Difficulty::Easy);
    evil.category = "<img onerror=x>".into();
    let html = project([&evil], Filter::All, &HashMap::new(), None).render().to_html();
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("&lt;img onerror=x&gt;"));
    assert!(!html.contains("<script>"));
    assert!(!html.contains("<img"));
  }

  #[test]
  fn header_badge_pluralizes() {
    let question = q("a", "Two Sum", Difficulty::Easy);
    assert_eq!(question_header(&question, 0).to_text(), "Two Sum");
    assert_eq!(question_header(&question, 1).to_text(), "Two Sum ✓ Solved 1 time");
    assert_eq!(question_header(&question, 3).to_text(), "Two Sum ✓ Solved 3 times");
  }
}
