use std::collections::{HashMap, HashSet};

use super::{Aggregate, Node};
use crate::jira::types::IssueRecord;

/// Build the forest for one fetch result.
///
/// A record is a root when it has no parent or its parent is not part of
/// `records`. Records whose parent is a root become that root's children, in
/// input order. Records whose parent is itself a child are promoted to the top
/// level, so nothing is ever dropped and depth never exceeds one. Repeated
/// keys keep their first occurrence only.
pub fn build(records: Vec<IssueRecord>) -> Vec<Node> {
  let mut seen = HashSet::new();
  let records: Vec<IssueRecord> = records
    .into_iter()
    .filter(|r| seen.insert(r.key.clone()))
    .collect();

  let parent_of: HashMap<&str, Option<&str>> = records
    .iter()
    .map(|r| (r.key.as_str(), r.parent_key.as_deref()))
    .collect();

  let is_root = |key: &str| match parent_of.get(key) {
    Some(Some(parent)) => !parent_of.contains_key(parent),
    _ => true,
  };

  // Placement of every record: None for top level, Some(parent) for a child
  let placement: Vec<Option<String>> = records
    .iter()
    .map(|r| match r.parent_key.as_deref() {
      Some(parent) if !is_root(&r.key) && is_root(parent) => Some(parent.to_string()),
      _ => None,
    })
    .collect();

  let mut forest: Vec<Node> = Vec::new();
  let mut index: HashMap<String, usize> = HashMap::new();
  let mut children: Vec<(String, IssueRecord)> = Vec::new();

  for (record, parent) in records.into_iter().zip(placement) {
    match parent {
      Some(parent) => children.push((parent, record)),
      None => {
        index.insert(record.key.clone(), forest.len());
        forest.push(Node::leaf(record));
      }
    }
  }

  for (parent, record) in children {
    if let Some(&idx) = index.get(&parent) {
      forest[idx].children.push(Node::leaf(record));
    }
  }

  for node in &mut forest {
    node.aggregate = aggregate(node);
  }

  forest
}

fn aggregate(node: &Node) -> Aggregate {
  let own = &node.issue;
  let spent = own.time_spent_seconds
    + node
      .children
      .iter()
      .map(|c| c.issue.time_spent_seconds)
      .sum::<u64>();
  let estimate = own.time_estimate_seconds
    + node
      .children
      .iter()
      .map(|c| c.issue.time_estimate_seconds)
      .sum::<u64>();
  Aggregate::new(spent, estimate, own.story_points)
}
