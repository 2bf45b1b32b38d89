use std::collections::HashMap;

use crate::cache::{CacheKey, ViewTarget};
use crate::db::Preferences;
use crate::tree::ExpandState;

/// Everything the controller knows about the user's browsing session.
///
/// Filters and expand state are remembered per view target, so switching
/// between views and back restores both.
#[derive(Debug, Clone)]
pub struct Session {
  project: String,
  current: ViewTarget,
  filters: HashMap<ViewTarget, String>,
  expand: HashMap<ViewTarget, ExpandState>,
  prefs: Preferences,
}

impl Session {
  /// Start on the project's sprint, or on "my issues" without a project
  pub fn new(project: impl Into<String>, prefs: Preferences) -> Self {
    let project = project.into();
    let current = if project.is_empty() {
      ViewTarget::my_issues(prefs.saved_project_scopes.clone())
    } else {
      ViewTarget::sprint(project.clone())
    };
    Self {
      project,
      current,
      filters: HashMap::new(),
      expand: HashMap::new(),
      prefs,
    }
  }

  /// Key the current view resolves to right now
  pub fn current_key(&self) -> CacheKey {
    CacheKey::new(
      self.current.clone(),
      self.filter().to_string(),
      self.prefs.hide_resolved,
    )
  }

  pub fn current_target(&self) -> &ViewTarget {
    &self.current
  }

  pub fn set_target(&mut self, target: ViewTarget) {
    self.current = target;
  }

  /// Filter text of the current view, empty if none
  pub fn filter(&self) -> &str {
    self
      .filters
      .get(&self.current)
      .map(String::as_str)
      .unwrap_or("")
  }

  pub fn set_filter(&mut self, text: impl Into<String>) {
    let text = text.into();
    if text.is_empty() {
      self.filters.remove(&self.current);
    } else {
      self.filters.insert(self.current.clone(), text);
    }
  }

  pub fn project(&self) -> &str {
    &self.project
  }

  pub fn set_project(&mut self, project: impl Into<String>) {
    self.project = project.into();
  }

  pub fn my_issues_target(&self) -> ViewTarget {
    ViewTarget::my_issues(self.prefs.saved_project_scopes.clone())
  }

  pub fn expand_state(&self, target: &ViewTarget) -> ExpandState {
    self.expand.get(target).cloned().unwrap_or_default()
  }

  pub fn expand_state_mut(&mut self, target: &ViewTarget) -> &mut ExpandState {
    self.expand.entry(target.clone()).or_default()
  }

  pub fn prefs(&self) -> &Preferences {
    &self.prefs
  }

  pub fn prefs_mut(&mut self) -> &mut Preferences {
    &mut self.prefs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_starts_on_sprint_with_project() {
    let session = Session::new("PROJ", Preferences::default());
    assert_eq!(session.current_target(), &ViewTarget::sprint("PROJ"));
    assert_eq!(session.filter(), "");
  }

  #[test]
  fn test_starts_on_my_issues_without_project() {
    let prefs = Preferences {
      saved_project_scopes: vec!["SEC".to_string(), "PROJ".to_string()],
      ..Default::default()
    };
    let session = Session::new("", prefs);
    assert_eq!(
      session.current_target(),
      &ViewTarget::my_issues(["PROJ", "SEC"])
    );
  }

  #[test]
  fn test_filters_are_per_target() {
    let mut session = Session::new("PROJ", Preferences::default());
    session.set_filter("login");
    let sprint_key = session.current_key();
    assert_eq!(sprint_key.filter(), "login");

    session.set_target(ViewTarget::backlog("PROJ"));
    assert_eq!(session.filter(), "");

    session.set_target(ViewTarget::sprint("PROJ"));
    assert_eq!(session.current_key(), sprint_key);
  }

  #[test]
  fn test_hide_resolved_is_part_of_key() {
    let mut session = Session::new("PROJ", Preferences::default());
    let visible = session.current_key();
    session.prefs_mut().hide_resolved = true;
    assert_ne!(session.current_key(), visible);
    assert!(session.current_key().hide_resolved());
  }
}
