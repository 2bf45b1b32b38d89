use crate::config::{AuthType, Config};
use crate::jira::api_types::{
  reserialize, ApiCreatedIssue, ApiIssue, ApiIssueFields, ApiMyself, ApiTransitionsResponse,
};
use crate::jira::jql::{self, SearchFilter};
use crate::jira::source::IssueSource;
use crate::jira::types::{CreateRequest, IssueRecord, Transition};
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Jira API client wrapper
#[derive(Clone)]
pub struct JiraClient {
  client: Arc<gouqi::r#async::Jira>,
  story_points_field: Arc<str>,
}

impl JiraClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let credentials = match config.jira.resolved_auth_type() {
      AuthType::Onpremise => gouqi::Credentials::Bearer(token),
      _ => gouqi::Credentials::Basic(config.jira.email.clone(), token),
    };

    let client = gouqi::r#async::Jira::new(&config.jira.url, credentials)
      .map_err(|e| eyre!("Failed to create Jira client: {}", e))?;

    Ok(Self {
      client: Arc::new(client),
      story_points_field: Arc::from(config.jira.story_points_field.as_str()),
    })
  }

  /// Search for issues using JQL
  pub async fn search_issues(&self, jql: &str) -> Result<Vec<IssueRecord>> {
    use futures::{StreamExt, TryStreamExt};

    debug!(jql, "searching issues");

    let search = self.client.search();
    let options = gouqi::SearchOptions::default();

    let stream = search
      .stream(jql, &options)
      .await
      .map_err(|e| eyre!("Failed to search issues: {}", e))?;

    let points_field = self.story_points_field.clone();
    let issues: Vec<IssueRecord> = stream
      .map(|issue| {
        let fields: ApiIssueFields = reserialize(&issue.fields)?;
        Ok(
          ApiIssue {
            key: issue.key,
            fields,
          }
          .into_record(&points_field),
        )
      })
      .try_collect()
      .await
      .map_err(|e: serde_json::Error| eyre!("Failed to parse issue: {}", e))?;

    Ok(issues)
  }

  /// Get the transitions available for an issue
  pub async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
    let endpoint = format!("/issue/{}/transitions", issue_key);

    let response: ApiTransitionsResponse = self
      .client
      .get("api", &endpoint)
      .await
      .map_err(|e| eyre!("Failed to get transitions for {}: {}", issue_key, e))?;

    Ok(
      response
        .transitions
        .into_iter()
        .map(Transition::from)
        .collect(),
    )
  }

  /// Update issue status by finding and executing the appropriate transition
  pub async fn update_issue_status(&self, issue_key: &str, status_id: &str) -> Result<()> {
    let transition_id = self
      .get_transitions(issue_key)
      .await?
      .into_iter()
      .find(|t| t.to_status_id == status_id)
      .map(|t| t.id)
      .ok_or_else(|| eyre!("No transition available to status {}", status_id))?;

    let endpoint = format!("/issue/{}/transitions", issue_key);
    let body = json!({
      "transition": {
        "id": transition_id
      }
    });

    self
      .client
      .post::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| eyre!("Failed to execute transition: {}", e))?;

    Ok(())
  }

  /// Overwrite fields of an issue
  pub async fn update_fields(&self, issue_key: &str, fields: Map<String, Value>) -> Result<()> {
    let endpoint = format!("/issue/{}", issue_key);
    let body = json!({ "fields": fields });

    self
      .client
      .put::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| eyre!("Failed to update {}: {}", issue_key, e))?;

    Ok(())
  }

  /// Create an issue, returning the new key
  pub async fn create(&self, request: &CreateRequest) -> Result<String> {
    let mut fields = json!({
      "project": { "key": request.project },
      "issuetype": { "name": request.issue_type },
      "summary": request.summary,
    });

    if request.assign_to_self {
      let me = self.myself().await?;
      let assignee = match (me.account_id, me.name) {
        (Some(id), _) => json!({ "accountId": id }),
        (None, Some(name)) => json!({ "name": name }),
        (None, None) => return Err(eyre!("Could not determine the current user")),
      };
      fields["assignee"] = assignee;
    }

    let created: ApiCreatedIssue = self
      .client
      .post("api", "/issue", json!({ "fields": fields }))
      .await
      .map_err(|e| eyre!("Failed to create issue in {}: {}", request.project, e))?;

    Ok(created.key)
  }

  async fn myself(&self) -> Result<ApiMyself> {
    self
      .client
      .get("api", "/myself")
      .await
      .map_err(|e| eyre!("Failed to get current user: {}", e))
  }
}

impl IssueSource for JiraClient {
  fn fetch_sprint_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    let client = self.clone();
    let jql = jql::sprint(project, filter);
    async move { client.search_issues(&jql).await }.boxed()
  }

  fn fetch_backlog_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    let client = self.clone();
    let jql = jql::backlog(project, filter);
    async move { client.search_issues(&jql).await }.boxed()
  }

  fn fetch_by_query(
    &self,
    scope_hint: &str,
    jql: &str,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    let client = self.clone();
    let jql = if jql.trim().is_empty() {
      jql::project_default(scope_hint)
    } else {
      jql.to_string()
    };
    async move { client.search_issues(&jql).await }.boxed()
  }

  fn fetch_transitions(&self, issue_key: &str) -> BoxFuture<'static, Result<Vec<Transition>>> {
    let client = self.clone();
    let key = issue_key.to_string();
    async move { client.get_transitions(&key).await }.boxed()
  }

  fn transition_issue(&self, issue_key: &str, status_id: &str) -> BoxFuture<'static, Result<()>> {
    let client = self.clone();
    let key = issue_key.to_string();
    let status_id = status_id.to_string();
    async move { client.update_issue_status(&key, &status_id).await }.boxed()
  }

  fn update_issue(
    &self,
    issue_key: &str,
    fields: Map<String, Value>,
  ) -> BoxFuture<'static, Result<()>> {
    let client = self.clone();
    let key = issue_key.to_string();
    async move { client.update_fields(&key, fields).await }.boxed()
  }

  fn create_issue(&self, request: &CreateRequest) -> BoxFuture<'static, Result<String>> {
    let client = self.clone();
    let request = request.clone();
    async move { client.create(&request).await }.boxed()
  }
}
