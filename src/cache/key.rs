//! Cache keys for view results.

use sha2::{Digest, Sha256};
use std::fmt;

/// Kind of view a result set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
  MyIssues,
  Sprint,
  Backlog,
  Jql,
}

impl ViewKind {
  pub fn label(&self) -> &'static str {
    match self {
      ViewKind::MyIssues => "My Issues",
      ViewKind::Sprint => "Sprint",
      ViewKind::Backlog => "Backlog",
      ViewKind::Jql => "JQL",
    }
  }

  fn tag(&self) -> &'static str {
    match self {
      ViewKind::MyIssues => "mine",
      ViewKind::Sprint => "sprint",
      ViewKind::Backlog => "backlog",
      ViewKind::Jql => "jql",
    }
  }
}

/// What a view is restricted to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
  Project(String),
  /// Always sorted and de-duplicated
  Projects(Vec<String>),
  Query(String),
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Project(p) => f.write_str(p),
      Scope::Projects(ps) => f.write_str(&ps.join(",")),
      Scope::Query(q) => f.write_str(q),
    }
  }
}

/// View identity: what the user is looking at, independent of filters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewTarget {
  kind: ViewKind,
  scope: Scope,
}

impl ViewTarget {
  /// Cross-project view of the acting user's issues
  pub fn my_issues<I, S>(projects: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut projects: Vec<String> = projects.into_iter().map(Into::into).collect();
    projects.sort();
    projects.dedup();
    Self {
      kind: ViewKind::MyIssues,
      scope: Scope::Projects(projects),
    }
  }

  pub fn sprint(project: impl Into<String>) -> Self {
    Self {
      kind: ViewKind::Sprint,
      scope: Scope::Project(project.into()),
    }
  }

  pub fn backlog(project: impl Into<String>) -> Self {
    Self {
      kind: ViewKind::Backlog,
      scope: Scope::Project(project.into()),
    }
  }

  pub fn jql(query: impl Into<String>) -> Self {
    Self {
      kind: ViewKind::Jql,
      scope: Scope::Query(query.into()),
    }
  }

  pub fn kind(&self) -> ViewKind {
    self.kind
  }

  pub fn scope(&self) -> &Scope {
    &self.scope
  }

  pub fn label(&self) -> String {
    format!("{} [{}]", self.kind.label(), self.scope)
  }
}

/// Identifies one reusable result set.
///
/// The resolved-visibility flag is part of the key, so results fetched with
/// and without resolved issues are cached side by side and never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  target: ViewTarget,
  filter: String,
  hide_resolved: bool,
}

impl CacheKey {
  pub fn new(target: ViewTarget, filter: impl Into<String>, hide_resolved: bool) -> Self {
    Self {
      target,
      filter: filter.into(),
      hide_resolved,
    }
  }

  pub fn target(&self) -> &ViewTarget {
    &self.target
  }

  pub fn kind(&self) -> ViewKind {
    self.target.kind
  }

  pub fn filter(&self) -> &str {
    &self.filter
  }

  pub fn hide_resolved(&self) -> bool {
    self.hide_resolved
  }

  /// Stable fixed-length digest, used to correlate log lines
  pub fn digest(&self) -> String {
    let scope = match &self.target.scope {
      Scope::Project(p) => format!("p:{}", p),
      Scope::Projects(ps) => format!("ps:{}", ps.join("\u{1f}")),
      Scope::Query(q) => format!("q:{}", q),
    };
    let input = format!(
      "{}\u{1e}{}\u{1e}{}\u{1e}{}",
      self.target.kind.tag(),
      scope,
      self.filter,
      self.hide_resolved
    );

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(&hasher.finalize()[..8])
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.target.kind.tag(), self.target.scope)?;
    if !self.filter.is_empty() {
      write!(f, " /{}", self.filter)?;
    }
    if self.hide_resolved {
      f.write_str(" -resolved")?;
    }
    Ok(())
  }
}
