use super::Node;

/// One visible line of the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
  /// Index of the top-level node
  pub top: usize,
  /// Index within the top-level node's children, `None` for the node itself
  pub child: Option<usize>,
}

impl Row {
  pub fn depth(&self) -> usize {
    if self.child.is_some() {
      1
    } else {
      0
    }
  }
}

/// Flatten the forest into visible rows.
///
/// A collapsed node contributes its own row only; an expanded one is followed
/// by one row per child.
pub fn flatten(forest: &[Node]) -> Vec<Row> {
  let mut rows = Vec::new();
  for (top, node) in forest.iter().enumerate() {
    rows.push(Row { top, child: None });
    if node.expanded {
      rows.extend((0..node.children.len()).map(|c| Row {
        top,
        child: Some(c),
      }));
    }
  }
  rows
}

/// Resolve a row back to its node
pub fn node_at(forest: &[Node], row: Row) -> Option<&Node> {
  let node = forest.get(row.top)?;
  match row.child {
    Some(c) => node.children.get(c),
    None => Some(node),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::types::fixtures::{child, record};
  use crate::tree::{build, toggle_node};

  #[test]
  fn test_collapsed_nodes_hide_children() {
    let forest = build(vec![record("A"), child("A1", "A"), record("B")]);
    let rows = flatten(&forest);
    assert_eq!(rows.len(), 2);
    assert_eq!(node_at(&forest, rows[1]).map(|n| n.key()), Some("B"));
  }

  #[test]
  fn test_expanded_node_lists_children_in_order() {
    let mut forest = build(vec![
      record("A"),
      child("A1", "A"),
      child("A2", "A"),
      record("B"),
    ]);
    toggle_node(&mut forest, "A");
    let rows = flatten(&forest);
    let keys: Vec<&str> = rows
      .iter()
      .filter_map(|r| node_at(&forest, *r))
      .map(|n| n.key())
      .collect();
    assert_eq!(keys, vec!["A", "A1", "A2", "B"]);
    assert_eq!(rows[1].depth(), 1);
    assert_eq!(rows[3].depth(), 0);
  }

  #[test]
  fn test_out_of_range_row() {
    let forest = build(vec![record("A")]);
    let row = Row { top: 3, child: None };
    assert!(node_at(&forest, row).is_none());
  }
}
