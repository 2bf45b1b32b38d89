use std::collections::HashSet;

use super::Node;

/// Expanded issue keys of one view, kept across re-renders of that view.
///
/// This is an overlay: it is never part of a cache entry and is merged onto
/// every freshly built forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
  expanded: HashSet<String>,
}

impl ExpandState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record the expanded flags of a rendered forest
  pub fn capture(forest: &[Node]) -> Self {
    let expanded = walk(forest)
      .filter(|n| n.expanded)
      .map(|n| n.issue.key.clone())
      .collect();
    Self { expanded }
  }

  pub fn is_expanded(&self, key: &str) -> bool {
    self.expanded.contains(key)
  }

  pub fn set(&mut self, key: &str, expanded: bool) {
    if expanded {
      self.expanded.insert(key.to_string());
    } else {
      self.expanded.remove(key);
    }
  }

  /// Copy the remembered flags onto `forest`; unknown keys stay collapsed
  pub fn apply(&self, forest: &mut [Node]) {
    for node in forest.iter_mut() {
      node.expanded = self.is_expanded(&node.issue.key);
      for child in node.children.iter_mut() {
        child.expanded = self.is_expanded(&child.issue.key);
      }
    }
  }
}

/// Carry expanded flags from `previous` over to the same keys in `fresh`
pub fn apply_expand_state(mut fresh: Vec<Node>, previous: &[Node]) -> Vec<Node> {
  ExpandState::capture(previous).apply(&mut fresh);
  fresh
}

/// Flip one node. Returns the new flag, or `None` if nothing changed because
/// the key is unknown or the node has no children.
pub fn toggle_node(forest: &mut [Node], key: &str) -> Option<bool> {
  let node = forest.iter_mut().find(|n| n.issue.key == key)?;
  if !node.has_children() {
    return None;
  }
  node.expanded = !node.expanded;
  Some(node.expanded)
}

/// Collapse everything if anything is expanded, otherwise expand everything.
///
/// Only nodes with children are touched. Returns the flag that was applied.
pub fn toggle_all(forest: &mut [Node]) -> bool {
  let any_expanded = forest.iter().any(|n| n.has_children() && n.expanded);
  let target = !any_expanded;
  for node in forest.iter_mut().filter(|n| n.has_children()) {
    node.expanded = target;
  }
  target
}

fn walk(forest: &[Node]) -> impl Iterator<Item = &Node> {
  forest
    .iter()
    .flat_map(|n| std::iter::once(n).chain(n.children.iter()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::types::fixtures::{child, record};
  use crate::tree::build;

  fn forest() -> Vec<Node> {
    build(vec![
      record("A"),
      child("A1", "A"),
      record("B"),
      child("B1", "B"),
      record("C"),
    ])
  }

  fn flags(forest: &[Node]) -> Vec<bool> {
    forest.iter().map(|n| n.expanded).collect()
  }

  #[test]
  fn test_toggle_node_flips_only_that_node() {
    let mut forest = forest();
    assert_eq!(toggle_node(&mut forest, "A"), Some(true));
    assert_eq!(flags(&forest), vec![true, false, false]);
    assert_eq!(toggle_node(&mut forest, "A"), Some(false));
    assert_eq!(flags(&forest), vec![false, false, false]);
  }

  #[test]
  fn test_toggle_node_without_children_is_noop() {
    let mut forest = forest();
    assert_eq!(toggle_node(&mut forest, "C"), None);
    assert_eq!(toggle_node(&mut forest, "MISSING"), None);
    assert_eq!(flags(&forest), vec![false, false, false]);
  }

  #[test]
  fn test_toggle_all_collapses_when_any_expanded() {
    let mut forest = forest();
    toggle_node(&mut forest, "B");
    assert!(!toggle_all(&mut forest));
    assert_eq!(flags(&forest), vec![false, false, false]);
  }

  #[test]
  fn test_toggle_all_expands_when_none_expanded() {
    let mut forest = forest();
    assert!(toggle_all(&mut forest));
    // C has no children and stays untouched
    assert_eq!(flags(&forest), vec![true, true, false]);
  }

  #[test]
  fn test_toggle_all_twice_restores_uniform_state() {
    let mut forest = forest();
    let before = flags(&forest);
    toggle_all(&mut forest);
    toggle_all(&mut forest);
    assert_eq!(flags(&forest), before);

    toggle_all(&mut forest);
    let expanded = flags(&forest);
    toggle_all(&mut forest);
    toggle_all(&mut forest);
    assert_eq!(flags(&forest), expanded);
  }

  #[test]
  fn test_apply_expand_state_copies_by_key() {
    let mut previous = forest();
    toggle_node(&mut previous, "B");

    // B moved and A disappeared in the fresh result
    let fresh = build(vec![
      record("B"),
      child("B1", "B"),
      record("D"),
      child("D1", "D"),
    ]);
    let merged = apply_expand_state(fresh, &previous);
    assert_eq!(flags(&merged), vec![true, false]);
  }

  #[test]
  fn test_expand_state_capture_and_set() {
    let mut forest = forest();
    toggle_node(&mut forest, "A");
    let mut state = ExpandState::capture(&forest);
    assert!(state.is_expanded("A"));
    assert!(!state.is_expanded("B"));

    state.set("A", false);
    state.set("B", true);
    state.apply(&mut forest);
    assert_eq!(flags(&forest), vec![false, true, false]);
  }
}
