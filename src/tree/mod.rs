//! Issue hierarchy: a flat fetch result turned into a one-level forest.
//!
//! A forest is an ordered list of top-level nodes, each owning a flat list of
//! children. Children never have children of their own.

mod builder;
mod expand;
mod rows;

pub use builder::build;
pub use expand::{apply_expand_state, toggle_all, toggle_node, ExpandState};
pub use rows::{flatten, node_at, Row};

use crate::jira::types::IssueRecord;

/// Metrics combining a node's own values with those of its children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
  pub total_time_spent: u64,
  pub total_time_estimate: u64,
  /// `None` when there is no estimate to measure against
  pub progress: Option<f64>,
  /// Own story points of a top-level node, never summed and never set on children
  pub story_points: Option<f64>,
}

impl Aggregate {
  fn new(time_spent: u64, time_estimate: u64, story_points: Option<f64>) -> Self {
    let progress = if time_estimate > 0 {
      Some(time_spent as f64 / time_estimate as f64)
    } else {
      None
    };
    Self {
      total_time_spent: time_spent,
      total_time_estimate: time_estimate,
      progress,
      story_points,
    }
  }
}

/// One position in the displayed hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub issue: IssueRecord,
  pub children: Vec<Node>,
  pub expanded: bool,
  pub aggregate: Aggregate,
}

impl Node {
  pub fn key(&self) -> &str {
    &self.issue.key
  }

  pub fn has_children(&self) -> bool {
    !self.children.is_empty()
  }

  fn leaf(issue: IssueRecord) -> Self {
    let aggregate = Aggregate::new(issue.time_spent_seconds, issue.time_estimate_seconds, None);
    Self {
      issue,
      children: Vec::new(),
      expanded: false,
      aggregate,
    }
  }
}
