//! Serde-deserializable types matching Jira API responses.
//!
//! These types are separate from domain types so that every optional or
//! vendor-specific field gets its default here, and the rest of the crate only
//! ever sees a fully populated `IssueRecord`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{IssueRecord, IssueType, Status, StatusCategory, Transition};

/// Re-serialize a value through JSON to convert between compatible types.
/// Useful for converting gouqi's BTreeMap fields to our typed structs.
pub fn reserialize<T: DeserializeOwned>(value: impl Serialize) -> serde_json::Result<T> {
  serde_json::from_value(serde_json::to_value(value)?)
}

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatusCategory {
  #[serde(default)]
  pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  #[serde(default)]
  pub id: String,
  pub name: String,
  #[serde(rename = "statusCategory")]
  pub category: Option<ApiStatusCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueType {
  pub name: String,
  #[serde(default)]
  pub subtask: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName")]
  pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiPriority {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiParent {
  pub key: String,
}

// ============================================================================
// Issue fields
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
  pub assignee: Option<ApiUser>,
  pub priority: Option<ApiPriority>,
  pub parent: Option<ApiParent>,
  #[serde(rename = "timespent")]
  pub time_spent: Option<u64>,
  #[serde(rename = "timeoriginalestimate")]
  pub time_original_estimate: Option<u64>,
  #[serde(rename = "timeestimate")]
  pub time_estimate: Option<u64>,
  // Catch-all for custom fields (story points live in one of these)
  #[serde(flatten)]
  pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Transitions endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiTransitionTo {
  pub id: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransition {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub to: ApiTransitionTo,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransitionsResponse {
  #[serde(default)]
  pub transitions: Vec<ApiTransition>,
}

// ============================================================================
// Create / myself responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCreatedIssue {
  pub key: String,
}

/// Cloud instances identify users by account id, on-premise ones by name
#[derive(Debug, Deserialize)]
pub struct ApiMyself {
  #[serde(rename = "accountId")]
  pub account_id: Option<String>,
  pub name: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiIssue {
  pub fn into_record(self, story_points_field: &str) -> IssueRecord {
    let f = self.fields;
    let issue_type = f
      .issue_type
      .map(|t| IssueType::from_name(&t.name, t.subtask))
      .unwrap_or_else(|| IssueType::Other(String::new()));

    // Newer Jira reports epics as `parent` of stories too; only sub-tasks nest here
    let parent_key = if issue_type.is_subtask() {
      f.parent.map(|p| p.key)
    } else {
      None
    };

    let status = f
      .status
      .map(|s| Status {
        id: s.id,
        name: s.name,
        category: s
          .category
          .map(|c| StatusCategory::from_key(&c.key))
          .unwrap_or_default(),
      })
      .unwrap_or_else(|| Status {
        id: String::new(),
        name: String::new(),
        category: StatusCategory::Unknown,
      });

    IssueRecord {
      key: self.key,
      issue_type,
      summary: f.summary,
      status,
      assignee: f.assignee.map(|u| u.display_name),
      priority: f.priority.map(|p| p.name),
      parent_key,
      story_points: f.extra.get(story_points_field).and_then(extract_number),
      time_spent_seconds: f.time_spent.unwrap_or(0),
      time_estimate_seconds: f.time_original_estimate.or(f.time_estimate).unwrap_or(0),
    }
  }
}

impl From<ApiTransition> for Transition {
  fn from(t: ApiTransition) -> Self {
    Transition {
      id: t.id,
      name: t.name,
      to_status_id: t.to.id,
      to_status_name: t.to.name,
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Story point fields are numbers on most instances but strings on some
fn extract_number(value: &serde_json::Value) -> Option<f64> {
  value
    .as_f64()
    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
