//! The boundary between the view controller and the issue tracker.
//!
//! Every operation is asynchronous and resolves exactly once. The controller
//! only ever talks to this trait, so tests can drive it with a scripted source.

use color_eyre::Result;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use super::jql::SearchFilter;
use super::types::{CreateRequest, IssueRecord, Transition};

pub trait IssueSource: Send + Sync {
  /// Issues in the open sprints of `project`
  fn fetch_sprint_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>>;

  /// Unplanned issues of `project`
  fn fetch_backlog_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>>;

  /// Run a ready-made query. `scope_hint` is used when the query is empty.
  fn fetch_by_query(&self, scope_hint: &str, jql: &str)
    -> BoxFuture<'static, Result<Vec<IssueRecord>>>;

  /// Transitions available from the issue's current status
  fn fetch_transitions(&self, issue_key: &str) -> BoxFuture<'static, Result<Vec<Transition>>>;

  /// Move an issue to the status with id `status_id`
  fn transition_issue(&self, issue_key: &str, status_id: &str) -> BoxFuture<'static, Result<()>>;

  /// Overwrite the given fields of an issue
  fn update_issue(&self, issue_key: &str, fields: Map<String, Value>)
    -> BoxFuture<'static, Result<()>>;

  /// Create an issue, returning its key
  fn create_issue(&self, request: &CreateRequest) -> BoxFuture<'static, Result<String>>;
}
