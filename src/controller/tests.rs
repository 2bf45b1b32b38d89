use super::*;
use crate::db::{NoopPreferences, Preferences};
use crate::jira::types::fixtures::{child, record};
use color_eyre::eyre::eyre;
use futures::FutureExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// What a scripted fetch resolves to
enum Reply {
  Records(Vec<IssueRecord>),
  Fail(&'static str),
}

struct Response {
  reply: Reply,
  gate: Option<oneshot::Receiver<()>>,
}

/// Issue source that answers from queues and records every call
#[derive(Default)]
struct ScriptedSource {
  fetches: Mutex<VecDeque<Response>>,
  mutations: Mutex<VecDeque<std::result::Result<Option<String>, &'static str>>>,
  calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
  fn reply(&self, records: Vec<IssueRecord>) {
    self.push(Reply::Records(records), None);
  }

  fn fail(&self, message: &'static str) {
    self.push(Reply::Fail(message), None);
  }

  /// Queue a reply that is held back until the returned sender fires
  fn gated(&self, records: Vec<IssueRecord>) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.push(Reply::Records(records), Some(rx));
    tx
  }

  /// Queue a failure that is held back until the returned sender fires
  fn gated_fail(&self, message: &'static str) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.push(Reply::Fail(message), Some(rx));
    tx
  }

  fn mutation(&self, result: std::result::Result<Option<String>, &'static str>) {
    self.mutations.lock().unwrap().push_back(result);
  }

  fn push(&self, reply: Reply, gate: Option<oneshot::Receiver<()>>) {
    self
      .fetches
      .lock()
      .unwrap()
      .push_back(Response { reply, gate });
  }

  fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  fn fetch(&self, call: String) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    self.calls.lock().unwrap().push(call);
    let next = self.fetches.lock().unwrap().pop_front();
    async move {
      let Some(Response { reply, gate }) = next else {
        return Err(eyre!("unscripted fetch"));
      };
      if let Some(gate) = gate {
        let _ = gate.await;
      }
      match reply {
        Reply::Records(records) => Ok(records),
        Reply::Fail(message) => Err(eyre!(message)),
      }
    }
    .boxed()
  }

  fn mutate(&self, call: String) -> BoxFuture<'static, Result<Option<String>>> {
    self.calls.lock().unwrap().push(call);
    let next = self.mutations.lock().unwrap().pop_front();
    async move {
      match next {
        Some(Ok(created)) => Ok(created),
        Some(Err(message)) => Err(eyre!(message)),
        None => Err(eyre!("unscripted mutation")),
      }
    }
    .boxed()
  }
}

impl IssueSource for ScriptedSource {
  fn fetch_sprint_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    self.fetch(format!("sprint:{}:{}:{}", project, filter.text, filter.hide_resolved))
  }

  fn fetch_backlog_issues(
    &self,
    project: &str,
    filter: &SearchFilter,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    self.fetch(format!("backlog:{}:{}:{}", project, filter.text, filter.hide_resolved))
  }

  fn fetch_by_query(
    &self,
    scope_hint: &str,
    jql: &str,
  ) -> BoxFuture<'static, Result<Vec<IssueRecord>>> {
    self.fetch(format!("query:{}:{}", scope_hint, jql))
  }

  fn fetch_transitions(&self, issue_key: &str) -> BoxFuture<'static, Result<Vec<Transition>>> {
    self.calls.lock().unwrap().push(format!("transitions:{}", issue_key));
    let transitions = vec![Transition {
      id: "21".to_string(),
      name: "Start".to_string(),
      to_status_id: "3".to_string(),
      to_status_name: "In Progress".to_string(),
    }];
    async move { Ok(transitions) }.boxed()
  }

  fn transition_issue(&self, issue_key: &str, status_id: &str) -> BoxFuture<'static, Result<()>> {
    let future = self.mutate(format!("transition:{}:{}", issue_key, status_id));
    async move { future.await.map(|_| ()) }.boxed()
  }

  fn update_issue(
    &self,
    issue_key: &str,
    _fields: Map<String, Value>,
  ) -> BoxFuture<'static, Result<()>> {
    let future = self.mutate(format!("update:{}", issue_key));
    async move { future.await.map(|_| ()) }.boxed()
  }

  fn create_issue(&self, request: &CreateRequest) -> BoxFuture<'static, Result<String>> {
    let future = self.mutate(format!("create:{}", request.project));
    async move {
      future
        .await
        .map(|created| created.unwrap_or_else(|| "NEW-1".to_string()))
    }
    .boxed()
  }
}

/// Preference store that keeps the last saved value in memory
#[derive(Clone, Default)]
struct MemoryPrefs(Arc<Mutex<Preferences>>);

impl PreferenceStore for MemoryPrefs {
  fn load(&self) -> Result<Preferences> {
    Ok(self.0.lock().unwrap().clone())
  }

  fn save(&self, prefs: &Preferences) -> Result<()> {
    *self.0.lock().unwrap() = prefs.clone();
    Ok(())
  }
}

fn controller(source: &Arc<ScriptedSource>) -> ViewController {
  ViewController::new(
    source.clone(),
    Box::new(NoopPreferences),
    Session::new("PROJ", Preferences::default()),
  )
}

fn parent_and_child() -> Vec<IssueRecord> {
  vec![record("PROJ-1"), child("PROJ-2", "PROJ-1")]
}

fn visible_keys(controller: &ViewController) -> Vec<String> {
  controller
    .rows()
    .into_iter()
    .filter_map(|row| controller.node_at(row))
    .map(|node| node.key().to_string())
    .collect()
}

fn errors(notices: &[Notice]) -> usize {
  notices
    .iter()
    .filter(|n| n.level == NoticeLevel::Error)
    .count()
}

#[tokio::test]
async fn test_miss_fetches_then_hit_skips_fetch() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("PROJ-1")]);
  let mut controller = controller(&source);

  controller.activate();
  assert!(matches!(controller.state(), ViewState::Loading { .. }));
  assert!(controller.forest().is_none());

  controller.wait().await;
  assert!(matches!(
    controller.state(),
    ViewState::Rendered {
      source: CacheSource::Network,
      ..
    }
  ));

  controller.activate();
  assert!(matches!(
    controller.state(),
    ViewState::Rendered {
      source: CacheSource::Cache(_),
      ..
    }
  ));
  assert_eq!(source.calls(), vec!["sprint:PROJ::false"]);
}

#[tokio::test]
async fn test_sprint_toggle_refresh_keeps_expansion() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(parent_and_child());
  source.reply(parent_and_child());
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  // Collapsed by default: one top-level row
  assert_eq!(visible_keys(&controller), vec!["PROJ-1"]);

  controller.toggle_node("PROJ-1");
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-2"]);

  controller.refresh();
  assert!(matches!(controller.state(), ViewState::Loading { .. }));
  controller.wait().await;

  assert_eq!(source.calls().len(), 2);
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-2"]);
  assert!(controller.forest().unwrap()[0].expanded);
}

#[tokio::test]
async fn test_late_response_is_cached_but_not_rendered() {
  let source = Arc::new(ScriptedSource::default());
  let release_sprint = source.gated(vec![record("SPRINT-1")]);
  source.reply(vec![record("BACKLOG-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.open_backlog(None);

  // Backlog arrives first and is shown
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["BACKLOG-1"]);

  // Sprint arrives late: cached, but the backlog stays on screen
  release_sprint.send(()).unwrap();
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["BACKLOG-1"]);
  assert_eq!(controller.current_key().kind(), ViewKind::Backlog);

  // Going back to the sprint is now a cache hit
  controller.open_sprint(None);
  assert!(matches!(
    controller.state(),
    ViewState::Rendered {
      source: CacheSource::Cache(_),
      ..
    }
  ));
  assert_eq!(visible_keys(&controller), vec!["SPRINT-1"]);
  assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn test_fetch_failure_leaves_cache_empty_and_retry_fetches() {
  let source = Arc::new(ScriptedSource::default());
  source.fail("connection refused");
  source.reply(vec![record("PROJ-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  let notices = controller.drain_notices();
  assert_eq!(notices.len(), 1);
  assert_eq!(errors(&notices), 1);
  assert!(notices[0].message.contains("connection refused"));
  assert_eq!(controller.state(), &ViewState::Idle);
  assert!(controller.cache().get(&controller.current_key()).is_none());

  controller.refresh();
  controller.wait().await;
  assert_eq!(source.calls().len(), 2);
  assert_eq!(visible_keys(&controller), vec!["PROJ-1"]);
}

#[tokio::test]
async fn test_empty_result_is_cached_with_notice() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(Vec::new());
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  assert_eq!(
    controller.drain_notices(),
    vec![Notice::info("No issues found")]
  );
  assert!(controller.rows().is_empty());
  assert_eq!(controller.forest().map(|f| f.len()), Some(0));
  assert!(controller.cache().get(&controller.current_key()).is_some());

  controller.activate();
  assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn test_failed_mutation_changes_nothing() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(parent_and_child());
  source.mutation(Err("transition not allowed"));
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;
  controller.toggle_node("PROJ-1");

  let forest_before = controller.forest().unwrap().to_vec();
  let state_before = controller.state().clone();
  let records_before = controller
    .cache()
    .get(&controller.current_key())
    .unwrap()
    .records
    .clone();

  controller.transition("PROJ-2", "3");
  controller.wait().await;

  assert_eq!(controller.forest().unwrap(), forest_before.as_slice());
  assert_eq!(controller.state(), &state_before);
  assert_eq!(
    controller
      .cache()
      .get(&controller.current_key())
      .unwrap()
      .records,
    records_before
  );
  let notices = controller.drain_notices();
  assert_eq!(notices.len(), 1);
  assert_eq!(errors(&notices), 1);
  assert_eq!(
    source.calls(),
    vec!["sprint:PROJ::false", "transition:PROJ-2:3"]
  );
}

#[tokio::test]
async fn test_successful_mutation_refetches_current_view() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("PROJ-1")]);
  source.mutation(Ok(None));
  source.reply(vec![record("PROJ-1"), record("PROJ-3")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  controller.transition("PROJ-1", "3");
  controller.wait().await;
  assert!(matches!(controller.state(), ViewState::Loading { .. }));

  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-3"]);
  assert_eq!(source.calls().len(), 3);
}

#[tokio::test]
async fn test_create_assigned_to_self_invalidates_my_issues() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("MINE-1")]);
  source.reply(vec![record("PROJ-1")]);
  source.mutation(Ok(Some("PROJ-9".to_string())));
  source.reply(vec![record("PROJ-1"), record("PROJ-9")]);
  let mut controller = controller(&source);

  controller.open_my_issues();
  controller.wait().await;
  let mine = controller.current_key();

  controller.open_sprint(None);
  controller.wait().await;

  controller.create(CreateRequest {
    project: "PROJ".to_string(),
    issue_type: "Task".to_string(),
    summary: "New thing".to_string(),
    assign_to_self: true,
  });
  controller.wait().await;
  controller.wait().await;

  assert!(controller.cache().get(&mine).is_none());
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-9"]);
  assert!(controller
    .drain_notices()
    .contains(&Notice::info("Created PROJ-9")));
}

#[tokio::test]
async fn test_mutation_from_other_view_does_not_switch_back() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("PROJ-1")]);
  source.reply(vec![record("BACKLOG-1")]);
  source.mutation(Ok(None));
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;
  let sprint = controller.current_key();

  controller.update_fields("PROJ-1", Map::new());
  controller.open_backlog(None);

  // Either order: backlog fetch and mutation completion
  controller.wait().await;
  controller.wait().await;

  assert_eq!(controller.current_key().kind(), ViewKind::Backlog);
  assert!(controller.cache().get(&sprint).is_none());
  assert_eq!(visible_keys(&controller), vec!["BACKLOG-1"]);
}

#[tokio::test]
async fn test_filter_change_is_a_different_key() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("PROJ-1"), record("PROJ-2")]);
  source.reply(vec![record("PROJ-2")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  controller.set_filter("login");
  assert!(matches!(controller.state(), ViewState::Loading { .. }));
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["PROJ-2"]);

  // Clearing the filter hits the earlier entry
  controller.set_filter("");
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-2"]);
  assert_eq!(
    source.calls(),
    vec!["sprint:PROJ::false", "sprint:PROJ:login:false"]
  );
}

#[tokio::test]
async fn test_hide_resolved_is_persisted_and_refetches() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("PROJ-1")]);
  source.reply(Vec::new());
  let prefs = MemoryPrefs::default();
  let mut controller = ViewController::new(
    source.clone(),
    Box::new(prefs.clone()),
    Session::new("PROJ", Preferences::default()),
  );

  controller.activate();
  controller.wait().await;

  controller.toggle_hide_resolved();
  assert!(prefs.load().unwrap().hide_resolved);
  controller.wait().await;

  assert!(controller.current_key().hide_resolved());
  assert_eq!(source.calls()[1], "sprint:PROJ::true");

  // Toggling back is a hit on the original entry
  controller.toggle_hide_resolved();
  assert_eq!(visible_keys(&controller), vec!["PROJ-1"]);
  assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn test_run_query_remembers_last_query() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("BUG-1")]);
  let prefs = MemoryPrefs::default();
  let mut controller = ViewController::new(
    source.clone(),
    Box::new(prefs.clone()),
    Session::new("PROJ", Preferences::default()),
  );

  controller.run_query("");
  assert_eq!(errors(&controller.drain_notices()), 1);

  controller.run_query("type = Bug");
  controller.wait().await;
  assert_eq!(prefs.load().unwrap().last_query.as_deref(), Some("type = Bug"));
  assert_eq!(source.calls(), vec!["query:PROJ:(type = Bug)"]);

  // Re-running the last query is a hit
  controller.open_sprint(None);
  controller.run_query("");
  assert_eq!(visible_keys(&controller), vec!["BUG-1"]);
}

#[tokio::test]
async fn test_my_issues_scope_and_query() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(vec![record("SEC-1")]);
  let mut controller = controller(&source);

  controller.set_project_scopes(vec!["sec".to_string(), "PROJ".to_string(), "SEC".to_string()]);
  controller.open_my_issues();
  controller.wait().await;

  assert_eq!(
    controller.session().prefs().saved_project_scopes,
    vec!["PROJ", "SEC"]
  );
  assert_eq!(
    source.calls(),
    vec![
      "query:PROJ,SEC:project in (\"PROJ\", \"SEC\") AND assignee = currentUser() \
       ORDER BY updated DESC"
    ]
  );
}

#[tokio::test]
async fn test_expand_state_survives_view_switch() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(parent_and_child());
  source.reply(vec![record("BACKLOG-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;
  controller.toggle_all();

  controller.open_backlog(None);
  controller.wait().await;

  controller.open_sprint(None);
  assert_eq!(visible_keys(&controller), vec!["PROJ-1", "PROJ-2"]);
}

#[tokio::test]
async fn test_sprint_without_project_is_an_error() {
  let source = Arc::new(ScriptedSource::default());
  let mut controller = ViewController::new(
    source.clone(),
    Box::new(NoopPreferences),
    Session::new("", Preferences::default()),
  );

  controller.open_sprint(None);
  assert_eq!(errors(&controller.drain_notices()), 1);
  assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_load_transitions() {
  let source = Arc::new(ScriptedSource::default());
  let mut controller = controller(&source);

  controller.load_transitions("PROJ-1");
  controller.wait().await;

  let (key, transitions) = controller.take_transitions().unwrap();
  assert_eq!(key, "PROJ-1");
  assert_eq!(transitions[0].to_status_name, "In Progress");
  assert!(controller.take_transitions().is_none());
}

#[tokio::test]
async fn test_poll_without_completions() {
  let source = Arc::new(ScriptedSource::default());
  let mut controller = controller(&source);
  assert!(!controller.poll());
}

#[tokio::test]
async fn test_old_failure_does_not_settle_newer_fetch_of_same_key() {
  let source = Arc::new(ScriptedSource::default());
  let release_first = source.gated_fail("timed out");
  source.reply(vec![record("BACKLOG-1")]);
  let release_second = source.gated(vec![record("PROJ-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.open_backlog(None);
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["BACKLOG-1"]);

  // Back to the sprint: not cached yet, so a second fetch starts
  controller.open_sprint(None);
  assert!(matches!(controller.state(), ViewState::Loading { .. }));

  release_first.send(()).unwrap();
  controller.wait().await;
  assert!(matches!(controller.state(), ViewState::Loading { .. }));
  assert_eq!(errors(&controller.drain_notices()), 0);

  release_second.send(()).unwrap();
  controller.wait().await;
  assert!(matches!(
    controller.state(),
    ViewState::Rendered {
      source: CacheSource::Network,
      ..
    }
  ));
  assert_eq!(visible_keys(&controller), vec!["PROJ-1"]);
}

#[tokio::test]
async fn test_concurrent_fetches_of_same_key_last_writer_wins() {
  let source = Arc::new(ScriptedSource::default());
  let release_first = source.gated(vec![record("OLD-1")]);
  let release_second = source.gated(vec![record("NEW-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.refresh();
  let key = controller.current_key();

  release_second.send(()).unwrap();
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["NEW-1"]);

  // The slower fetch still completes and overwrites the entry
  release_first.send(()).unwrap();
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["OLD-1"]);
  let cached: Vec<&str> = controller
    .cache()
    .get(&key)
    .unwrap()
    .records
    .iter()
    .map(|r| r.key.as_str())
    .collect();
  assert_eq!(cached, vec!["OLD-1"]);
  assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn test_failure_of_hidden_view_leaves_visible_view_alone() {
  let source = Arc::new(ScriptedSource::default());
  let release_sprint = source.gated_fail("server error");
  source.reply(vec![record("BACKLOG-1")]);
  let mut controller = controller(&source);

  controller.activate();
  controller.open_backlog(None);
  controller.wait().await;
  let shown = controller.state().clone();

  release_sprint.send(()).unwrap();
  controller.wait().await;

  let notices = controller.drain_notices();
  assert_eq!(notices.len(), 1);
  assert_eq!(errors(&notices), 1);
  assert!(notices[0].message.contains("server error"));
  assert_eq!(controller.state(), &shown);
  assert_eq!(visible_keys(&controller), vec!["BACKLOG-1"]);
}

#[tokio::test]
async fn test_issue_that_drops_out_comes_back_collapsed() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(parent_and_child());
  source.reply(vec![record("PROJ-3")]);
  source.reply(parent_and_child());
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;
  controller.toggle_node("PROJ-1");
  assert!(controller.forest().unwrap()[0].expanded);

  controller.refresh();
  controller.wait().await;
  assert_eq!(visible_keys(&controller), vec!["PROJ-3"]);

  controller.refresh();
  controller.wait().await;
  assert!(!controller.forest().unwrap()[0].expanded);
  assert_eq!(visible_keys(&controller), vec!["PROJ-1"]);
}

#[tokio::test]
async fn test_toggle_ignores_forest_of_another_view() {
  let source = Arc::new(ScriptedSource::default());
  source.reply(parent_and_child());
  let release_backlog = source.gated(parent_and_child());
  let mut controller = controller(&source);

  controller.activate();
  controller.wait().await;

  // Backlog is loading; the sprint forest is hidden and must not change
  controller.open_backlog(None);
  controller.toggle_node("PROJ-1");
  controller.toggle_all();

  controller.open_sprint(None);
  assert!(!controller.forest().unwrap()[0].expanded);

  release_backlog.send(()).unwrap();
  controller.wait().await;
  controller.open_backlog(None);
  assert!(!controller.forest().unwrap()[0].expanded);
}
