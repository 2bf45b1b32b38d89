//! JQL builders for each view kind.
//!
//! Pure string composition so the exact query a view sends can be tested
//! without a server.

/// Filter options that apply on top of a view's base query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
  /// Free text matched against issue summaries, empty for none
  pub text: String,
  /// Restrict results to unresolved issues
  pub hide_resolved: bool,
}

impl SearchFilter {
  pub fn new(text: impl Into<String>, hide_resolved: bool) -> Self {
    Self {
      text: text.into(),
      hide_resolved,
    }
  }

  fn clauses(&self) -> Vec<String> {
    let mut clauses = Vec::new();
    let text = self.text.trim();
    if !text.is_empty() {
      clauses.push(format!("summary ~ \"{}\"", escape(text)));
    }
    if self.hide_resolved {
      clauses.push("resolution = Unresolved".to_string());
    }
    clauses
  }
}

/// Issues in the open sprints of a project
pub fn sprint(project: &str, filter: &SearchFilter) -> String {
  build(
    vec![
      format!("project = \"{}\"", escape(project)),
      "sprint in openSprints()".to_string(),
    ],
    filter,
    "Rank ASC",
  )
}

/// Issues of a project that are not planned into any sprint
pub fn backlog(project: &str, filter: &SearchFilter) -> String {
  build(
    vec![
      format!("project = \"{}\"", escape(project)),
      "sprint is EMPTY".to_string(),
      "statusCategory != Done".to_string(),
    ],
    filter,
    "Rank ASC",
  )
}

/// Issues assigned to the acting user across a set of projects
pub fn my_issues(projects: &[String], filter: &SearchFilter) -> String {
  let mut base = vec!["assignee = currentUser()".to_string()];
  if !projects.is_empty() {
    let list: Vec<String> = projects
      .iter()
      .map(|p| format!("\"{}\"", escape(p)))
      .collect();
    base.insert(0, format!("project in ({})", list.join(", ")));
  }
  build(base, filter, "updated DESC")
}

/// Apply a filter to a user-supplied query, keeping its ORDER BY at the end
pub fn compose(raw: &str, filter: &SearchFilter) -> String {
  let (condition, order) = split_order_by(raw);
  let condition = condition.trim();
  let mut clauses = Vec::new();
  if !condition.is_empty() {
    clauses.push(format!("({})", condition));
  }
  clauses.extend(filter.clauses());

  let mut jql = clauses.join(" AND ");
  if let Some(order) = order {
    if !jql.is_empty() {
      jql.push(' ');
    }
    jql.push_str(order.trim());
  }
  jql
}

/// Fallback when a query view has no text at all
pub fn project_default(project: &str) -> String {
  if project.is_empty() {
    "ORDER BY updated DESC".to_string()
  } else {
    format!("project = \"{}\" ORDER BY updated DESC", escape(project))
  }
}

fn build(mut base: Vec<String>, filter: &SearchFilter, order: &str) -> String {
  base.extend(filter.clauses());
  format!("{} ORDER BY {}", base.join(" AND "), order)
}

/// Split `... ORDER BY x` into the condition and the ORDER BY clause
fn split_order_by(raw: &str) -> (&str, Option<&str>) {
  match find_order_by(raw) {
    Some(idx) => (&raw[..idx], Some(&raw[idx..])),
    None => (raw, None),
  }
}

/// Byte offset of the last `ORDER BY` keyword outside quoted literals
fn find_order_by(raw: &str) -> Option<usize> {
  let bytes = raw.as_bytes();
  let mut quote: Option<u8> = None;
  let mut found = None;
  let mut i = 0;

  while i < bytes.len() {
    let b = bytes[i];
    match quote {
      Some(_) if b == b'\\' => i += 1,
      Some(q) if b == q => quote = None,
      Some(_) => {}
      None if b == b'"' || b == b'\'' => quote = Some(b),
      None if starts_word(bytes, i) && is_order_by(&bytes[i..]) => found = Some(i),
      None => {}
    }
    i += 1;
  }
  found
}

fn is_word_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

fn starts_word(bytes: &[u8], i: usize) -> bool {
  i == 0 || !is_word_byte(bytes[i - 1])
}

/// `ORDER`, whitespace, then `BY` ending at a word boundary
fn is_order_by(rest: &[u8]) -> bool {
  if rest.len() < 5 || !rest[..5].eq_ignore_ascii_case(b"order") {
    return false;
  }
  let rest = &rest[5..];
  let gap = rest.iter().take_while(|b| b.is_ascii_whitespace()).count();
  let rest = &rest[gap..];
  gap > 0
    && rest.len() >= 2
    && rest[..2].eq_ignore_ascii_case(b"by")
    && rest.get(2).map_or(true, |b| !is_word_byte(*b))
}

fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}
