mod app;
mod cache;
mod commands;
mod config;
mod controller;
mod db;
mod event;
mod jira;
mod logging;
mod tree;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use controller::{Session, ViewController};
use db::{NoopPreferences, PreferenceStore, Preferences, SqlitePreferences};
use jira::client::JiraClient;

#[derive(Parser, Debug)]
#[command(name = "jtree")]
#[command(about = "Browse Jira sprints, backlogs and queries as a tree")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jtree/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Jira project key to start in
  #[arg(short, long)]
  project: Option<String>,

  /// Start with an ad-hoc JQL query instead of the sprint
  #[arg(short, long)]
  jql: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = match logging::init() {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("Logging disabled: {}", e);
      None
    }
  };

  let config = config::Config::load(args.config.as_deref())?;

  let project = args
    .project
    .or_else(|| config.default_project.clone())
    .map(|p| p.trim().to_uppercase())
    .unwrap_or_default();

  let store: Box<dyn PreferenceStore> = match SqlitePreferences::open() {
    Ok(store) => Box::new(store),
    Err(e) => {
      warn!(error = %e, "preferences database unavailable, nothing will be remembered");
      Box::new(NoopPreferences)
    }
  };

  let prefs = match store.load() {
    Ok(prefs) => prefs,
    Err(e) => {
      warn!(error = %e, "failed to load preferences, using defaults");
      Preferences::default()
    }
  };
  let prefs = merge_project_scopes(prefs, &config.projects, &project);

  info!(project = %project, scopes = ?prefs.saved_project_scopes, "starting");

  let client = JiraClient::new(&config)?;
  let controller = ViewController::new(Arc::new(client), store, Session::new(project, prefs));

  let mut app = app::App::new(config, controller);
  app.run(args.jql).await?;

  Ok(())
}

/// Union of persisted and configured scopes. Falls back to the start
/// project so "my issues" is never unscoped on first run.
fn merge_project_scopes(mut prefs: Preferences, configured: &[String], project: &str) -> Preferences {
  let scopes = &mut prefs.saved_project_scopes;
  scopes.extend(configured.iter().map(|p| p.trim().to_uppercase()));
  if scopes.is_empty() && !project.is_empty() {
    scopes.push(project.to_string());
  }
  scopes.retain(|p| !p.is_empty());
  scopes.sort();
  scopes.dedup();
  prefs
}
