//! View activation life cycle.
//!
//! The controller owns the session, the view cache and the rendered forest.
//! It runs on a single task: fetches and mutations are spawned onto the
//! runtime and report back over a channel that `poll` drains on every tick.
//! Each request carries the cache key that was current when it was issued,
//! and a completion only replaces what is on screen if that key is still
//! current when it arrives. Fetches are also numbered, so an older fetch of
//! the same key cannot settle the loading state of a newer one.

mod session;

pub use session::Session;

use color_eyre::Result;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheSource, Scope, ViewCache, ViewKind, ViewTarget};
use crate::db::PreferenceStore;
use crate::jira::jql::{self, SearchFilter};
use crate::jira::source::IssueSource;
use crate::jira::types::{CreateRequest, IssueRecord, Transition};
use crate::tree::{self, ExpandState, Node, Row};

/// State of the current view activation
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
  Idle,
  Loading { key: CacheKey, request: u64 },
  Rendered { key: CacheKey, source: CacheSource },
  Failed { key: CacheKey, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

#[derive(Debug, Clone)]
enum Mutation {
  Transition { issue_key: String },
  Update { issue_key: String },
  Create { project: String, assigned_to_self: bool },
}

impl Mutation {
  fn describe(&self) -> String {
    match self {
      Mutation::Transition { issue_key } => format!("transition {}", issue_key),
      Mutation::Update { issue_key } => format!("update {}", issue_key),
      Mutation::Create { project, .. } => format!("create issue in {}", project),
    }
  }
}

/// Results delivered back to the controller task
#[derive(Debug)]
enum Completion {
  Fetch {
    key: CacheKey,
    request: u64,
    result: std::result::Result<Vec<IssueRecord>, String>,
  },
  Mutation {
    origin: CacheKey,
    mutation: Mutation,
    /// Created issue key, if any
    result: std::result::Result<Option<String>, String>,
  },
  Transitions {
    issue_key: String,
    result: std::result::Result<Vec<Transition>, String>,
  },
}

pub struct ViewController {
  source: Arc<dyn IssueSource>,
  prefs_store: Box<dyn PreferenceStore>,
  session: Session,
  cache: ViewCache,
  state: ViewState,
  next_request: u64,

  /// Last rendered forest and the view it belongs to
  forest: Vec<Node>,
  forest_target: Option<ViewTarget>,

  notices: Vec<Notice>,
  transitions: Option<(String, Vec<Transition>)>,

  tx: mpsc::UnboundedSender<Completion>,
  rx: mpsc::UnboundedReceiver<Completion>,
}

impl ViewController {
  pub fn new(
    source: Arc<dyn IssueSource>,
    prefs_store: Box<dyn PreferenceStore>,
    session: Session,
  ) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      source,
      prefs_store,
      session,
      cache: ViewCache::new(),
      state: ViewState::Idle,
      next_request: 0,
      forest: Vec::new(),
      forest_target: None,
      notices: Vec::new(),
      transitions: None,
      tx,
      rx,
    }
  }

  // ==========================================================================
  // Activation
  // ==========================================================================

  /// Show the current view: from cache on a hit, otherwise start a fetch
  pub fn activate(&mut self) {
    let key = self.session.current_key();

    if let Some(entry) = self.cache.get(&key) {
      let records = entry.records.clone();
      let source = CacheSource::Cache(entry.cached_at);
      info!(key = %key, "cache hit");
      self.render(key, records, source);
      return;
    }

    info!(key = %key, digest = %key.digest(), "cache miss, fetching");
    self.next_request += 1;
    let request = self.next_request;
    self.set_state(ViewState::Loading {
      key: key.clone(),
      request,
    });

    let future = self.dispatch(&key);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = future.await.map_err(|e| e.to_string());
      // Ignore send errors - controller may have been dropped
      let _ = tx.send(Completion::Fetch {
        key,
        request,
        result,
      });
    });
  }

  /// Switch to another view target and activate it
  pub fn open(&mut self, target: ViewTarget) {
    self.session.set_target(target);
    self.activate();
  }

  pub fn open_my_issues(&mut self) {
    let target = self.session.my_issues_target();
    self.open(target);
  }

  /// Open the sprint view, optionally switching project first
  pub fn open_sprint(&mut self, project: Option<&str>) {
    if let Some(project) = self.select_project(project) {
      self.open(ViewTarget::sprint(project));
    }
  }

  /// Open the backlog view, optionally switching project first
  pub fn open_backlog(&mut self, project: Option<&str>) {
    if let Some(project) = self.select_project(project) {
      self.open(ViewTarget::backlog(project));
    }
  }

  /// Run an ad-hoc query; empty text re-runs the last one
  pub fn run_query(&mut self, text: &str) {
    let text = text.trim();
    let query = if text.is_empty() {
      match self.session.prefs().last_query.clone() {
        Some(last) => last,
        None => {
          self.notify(Notice::error("No previous query to run"));
          return;
        }
      }
    } else {
      text.to_string()
    };

    if self.session.prefs().last_query.as_deref() != Some(query.as_str()) {
      self.session.prefs_mut().last_query = Some(query.clone());
      self.persist();
    }
    self.open(ViewTarget::jql(query));
  }

  /// Apply filter text to the current view. Filters are part of the key,
  /// so this never invalidates anything.
  pub fn set_filter(&mut self, text: &str) {
    self.session.set_filter(text.trim());
    self.activate();
  }

  /// Drop the current view's entry and fetch it again
  pub fn refresh(&mut self) {
    let key = self.session.current_key();
    self.cache.invalidate(&key);
    self.activate();
  }

  /// Drop every entry and fetch the current view again
  pub fn refresh_all(&mut self) {
    self.cache.invalidate_all();
    self.activate();
  }

  /// Show or hide resolved issues in every view
  pub fn toggle_hide_resolved(&mut self) {
    let hide = !self.session.prefs().hide_resolved;
    self.session.prefs_mut().hide_resolved = hide;
    self.persist();
    self.notify(Notice::info(if hide {
      "Hiding resolved issues"
    } else {
      "Showing resolved issues"
    }));
    self.activate();
  }

  /// Replace the projects of the "my issues" view
  pub fn set_project_scopes(&mut self, projects: Vec<String>) {
    let mut projects: Vec<String> = projects
      .into_iter()
      .map(|p| p.trim().to_uppercase())
      .filter(|p| !p.is_empty())
      .collect();
    projects.sort();
    projects.dedup();

    self.session.prefs_mut().saved_project_scopes = projects;
    self.persist();

    if self.session.current_target().kind() == ViewKind::MyIssues {
      self.open_my_issues();
    }
  }

  fn select_project(&mut self, project: Option<&str>) -> Option<String> {
    if let Some(project) = project.map(str::trim).filter(|p| !p.is_empty()) {
      self.session.set_project(project.to_uppercase());
    }
    if self.session.project().is_empty() {
      self.notify(Notice::error("No project selected"));
      return None;
    }
    Some(self.session.project().to_string())
  }

  fn dispatch(&self, key: &CacheKey) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    let filter = SearchFilter::new(key.filter(), key.hide_resolved());
    match key.target().scope() {
      Scope::Project(project) if key.kind() == ViewKind::Backlog => {
        self.source.fetch_backlog_issues(project, &filter)
      }
      Scope::Project(project) => self.source.fetch_sprint_issues(project, &filter),
      Scope::Projects(projects) => self
        .source
        .fetch_by_query(&projects.join(","), &jql::my_issues(projects, &filter)),
      Scope::Query(query) => self
        .source
        .fetch_by_query(self.session.project(), &jql::compose(query, &filter)),
    }
  }

  fn render(&mut self, key: CacheKey, records: Vec<IssueRecord>, source: CacheSource) {
    let target = key.target().clone();
    let mut forest = tree::build(records);
    self.session.expand_state(&target).apply(&mut forest);
    // Keys that dropped out of this result start collapsed if they come back
    *self.session.expand_state_mut(&target) = ExpandState::capture(&forest);

    debug!(key = %key, roots = forest.len(), "rendering forest");
    self.forest = forest;
    self.forest_target = Some(target);
    self.set_state(ViewState::Rendered { key, source });
  }

  fn set_state(&mut self, state: ViewState) {
    let name = match &state {
      ViewState::Idle => "idle",
      ViewState::Loading { .. } => "loading",
      ViewState::Rendered { .. } => "rendered",
      ViewState::Failed { .. } => "failed",
    };
    debug!(state = name, "view state");
    self.state = state;
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  /// Move an issue to another status
  pub fn transition(&mut self, issue_key: &str, status_id: &str) {
    let future = self.source.transition_issue(issue_key, status_id);
    self.spawn_mutation(
      Mutation::Transition {
        issue_key: issue_key.to_string(),
      },
      async move { future.await.map(|_| None) },
    );
  }

  /// Overwrite fields of an issue
  pub fn update_fields(&mut self, issue_key: &str, fields: Map<String, Value>) {
    let future = self.source.update_issue(issue_key, fields);
    self.spawn_mutation(
      Mutation::Update {
        issue_key: issue_key.to_string(),
      },
      async move { future.await.map(|_| None) },
    );
  }

  /// Create an issue
  pub fn create(&mut self, request: CreateRequest) {
    let future = self.source.create_issue(&request);
    self.spawn_mutation(
      Mutation::Create {
        project: request.project.clone(),
        assigned_to_self: request.assign_to_self,
      },
      async move { future.await.map(Some) },
    );
  }

  /// Fetch the transitions available for an issue; see `take_transitions`
  pub fn load_transitions(&mut self, issue_key: &str) {
    let future = self.source.fetch_transitions(issue_key);
    let issue_key = issue_key.to_string();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = future.await.map_err(|e| e.to_string());
      let _ = tx.send(Completion::Transitions { issue_key, result });
    });
  }

  fn spawn_mutation<F>(&mut self, mutation: Mutation, future: F)
  where
    F: std::future::Future<Output = Result<Option<String>>> + Send + 'static,
  {
    let origin = self.session.current_key();
    info!(key = %origin, mutation = %mutation.describe(), "mutation started");
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = future.await.map_err(|e| e.to_string());
      let _ = tx.send(Completion::Mutation {
        origin,
        mutation,
        result,
      });
    });
  }

  // ==========================================================================
  // Completions
  // ==========================================================================

  /// Handle every completion that has arrived. Returns true if anything did.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(completion) = self.rx.try_recv() {
      self.handle(completion);
      changed = true;
    }
    changed
  }

  /// Wait for the next completion and handle it
  pub async fn wait(&mut self) {
    if let Some(completion) = self.rx.recv().await {
      self.handle(completion);
    }
  }

  fn handle(&mut self, completion: Completion) {
    match completion {
      Completion::Fetch {
        key,
        request,
        result,
      } => self.handle_fetch(key, request, result),
      Completion::Mutation {
        origin,
        mutation,
        result,
      } => self.handle_mutation(origin, mutation, result),
      Completion::Transitions { issue_key, result } => match result {
        Ok(transitions) if transitions.is_empty() => {
          self.notify(Notice::info(format!("No transitions available for {}", issue_key)));
        }
        Ok(transitions) => self.transitions = Some((issue_key, transitions)),
        Err(error) => self.notify(Notice::error(format!(
          "Failed to load transitions for {}: {}",
          issue_key, error
        ))),
      },
    }
  }

  fn handle_fetch(
    &mut self,
    key: CacheKey,
    request: u64,
    result: std::result::Result<Vec<IssueRecord>, String>,
  ) {
    let current = key == self.session.current_key();

    match result {
      Ok(records) => {
        info!(key = %key, records = records.len(), current, "fetch completed");
        let empty = records.is_empty();
        self.cache.put(key.clone(), records.clone());

        if current {
          self.render(key, records, CacheSource::Network);
          if empty {
            self.notify(Notice::info("No issues found"));
          }
        }
      }
      Err(error) => {
        let (loading_key, superseded) = match &self.state {
          ViewState::Loading {
            key: loading,
            request: pending,
          } if *loading == key => (true, *pending != request),
          _ => (false, false),
        };

        if superseded {
          // A newer fetch of the same key is in flight and reports for itself
          warn!(key = %key, request, %error, "superseded fetch failed");
          return;
        }

        warn!(key = %key, request, %error, "fetch failed");
        self.notify(Notice::error(format!(
          "Failed to load {}: {}",
          key.target().label(),
          error
        )));

        if loading_key {
          self.set_state(ViewState::Failed { key, error });
          self.set_state(ViewState::Idle);
        }
      }
    }
  }

  fn handle_mutation(
    &mut self,
    origin: CacheKey,
    mutation: Mutation,
    result: std::result::Result<Option<String>, String>,
  ) {
    let created = match result {
      Ok(created) => created,
      Err(error) => {
        warn!(key = %origin, mutation = %mutation.describe(), %error, "mutation failed");
        self.notify(Notice::error(format!(
          "Failed to {}: {}",
          mutation.describe(),
          error
        )));
        return;
      }
    };

    info!(key = %origin, mutation = %mutation.describe(), "mutation succeeded");
    self.cache.invalidate(&origin);

    let message = match &mutation {
      Mutation::Transition { issue_key } => format!("{} transitioned", issue_key),
      Mutation::Update { issue_key } => format!("{} updated", issue_key),
      Mutation::Create {
        project,
        assigned_to_self,
      } => {
        if *assigned_to_self {
          self.cache.invalidate_kind(ViewKind::MyIssues);
        }
        match created {
          Some(key) => format!("Created {}", key),
          None => format!("Created issue in {}", project),
        }
      }
    };
    self.notify(Notice::info(message));

    if origin == self.session.current_key() {
      self.activate();
    }
  }

  // ==========================================================================
  // Expand state
  // ==========================================================================

  /// Expand or collapse one node of the rendered forest
  pub fn toggle_node(&mut self, issue_key: &str) {
    if self.forest().is_none() {
      return;
    }
    if let Some(expanded) = tree::toggle_node(&mut self.forest, issue_key) {
      if let Some(target) = &self.forest_target {
        self
          .session
          .expand_state_mut(target)
          .set(issue_key, expanded);
      }
    }
  }

  /// Collapse all if anything is expanded, otherwise expand all
  pub fn toggle_all(&mut self) {
    if self.forest().is_none() {
      return;
    }
    let expanded = tree::toggle_all(&mut self.forest);
    if let Some(target) = &self.forest_target {
      let state = self.session.expand_state_mut(target);
      for node in self.forest.iter().filter(|n| n.has_children()) {
        state.set(node.key(), expanded);
      }
    }
  }

  // ==========================================================================
  // Accessors
  // ==========================================================================

  pub fn state(&self) -> &ViewState {
    &self.state
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn current_key(&self) -> CacheKey {
    self.session.current_key()
  }

  pub fn cache(&self) -> &ViewCache {
    &self.cache
  }

  /// The forest of the current view, if one has been rendered for it
  pub fn forest(&self) -> Option<&[Node]> {
    match &self.forest_target {
      Some(target) if target == self.session.current_target() => Some(self.forest.as_slice()),
      _ => None,
    }
  }

  /// Visible rows of the current view
  pub fn rows(&self) -> Vec<Row> {
    self.forest().map(tree::flatten).unwrap_or_default()
  }

  pub fn node_at(&self, row: Row) -> Option<&Node> {
    self.forest().and_then(|forest| tree::node_at(forest, row))
  }

  pub fn drain_notices(&mut self) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }

  pub fn take_transitions(&mut self) -> Option<(String, Vec<Transition>)> {
    self.transitions.take()
  }

  fn notify(&mut self, notice: Notice) {
    match notice.level {
      NoticeLevel::Info => info!(message = %notice.message, "notice"),
      NoticeLevel::Error => warn!(message = %notice.message, "notice"),
    }
    self.notices.push(notice);
  }

  fn persist(&mut self) {
    if let Err(e) = self.prefs_store.save(self.session.prefs()) {
      self.notify(Notice::error(format!("Failed to save preferences: {}", e)));
    }
  }
}

#[cfg(test)]
mod tests;
