use std::fmt;

/// Issue type as reported by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueType {
  Bug,
  Story,
  Task,
  Epic,
  SubTask,
  Other(String),
}

impl IssueType {
  /// Map a tracker type name onto a known variant.
  ///
  /// `subtask` is the tracker's own flag and wins over the name, since
  /// sub-task types can be renamed per project.
  pub fn from_name(name: &str, subtask: bool) -> Self {
    if subtask {
      return IssueType::SubTask;
    }
    match name.to_lowercase().as_str() {
      "bug" => IssueType::Bug,
      "story" => IssueType::Story,
      "task" => IssueType::Task,
      "epic" => IssueType::Epic,
      "sub-task" | "subtask" => IssueType::SubTask,
      _ => IssueType::Other(name.to_string()),
    }
  }

  pub fn is_subtask(&self) -> bool {
    matches!(self, IssueType::SubTask)
  }

  pub fn name(&self) -> &str {
    match self {
      IssueType::Bug => "Bug",
      IssueType::Story => "Story",
      IssueType::Task => "Task",
      IssueType::Epic => "Epic",
      IssueType::SubTask => "Sub-task",
      IssueType::Other(name) => name,
    }
  }
}

impl fmt::Display for IssueType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Coarse status grouping shared by every workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCategory {
  ToDo,
  InProgress,
  Done,
  #[default]
  Unknown,
}

impl StatusCategory {
  pub fn from_key(key: &str) -> Self {
    match key {
      "new" => StatusCategory::ToDo,
      "indeterminate" => StatusCategory::InProgress,
      "done" => StatusCategory::Done,
      _ => StatusCategory::Unknown,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
  pub id: String,
  pub name: String,
  pub category: StatusCategory,
}

/// One fetched issue, normalized at the deserialization boundary.
///
/// Immutable once built; a cache entry owns the list it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
  pub key: String,
  pub issue_type: IssueType,
  pub summary: String,
  pub status: Status,
  pub assignee: Option<String>,
  pub priority: Option<String>,
  /// Only set for sub-task types
  pub parent_key: Option<String>,
  pub story_points: Option<f64>,
  pub time_spent_seconds: u64,
  pub time_estimate_seconds: u64,
}

impl IssueRecord {
  /// Assignee name for display
  pub fn assignee_label(&self) -> &str {
    self.assignee.as_deref().unwrap_or("Unassigned")
  }
}

/// A workflow transition available from an issue's current status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub id: String,
  pub name: String,
  pub to_status_id: String,
  pub to_status_name: String,
}

/// Minimal fields needed to create an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
  pub project: String,
  pub issue_type: String,
  pub summary: String,
  pub assign_to_self: bool,
}
