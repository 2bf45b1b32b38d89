use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub jira: JiraConfig,
  pub default_project: Option<String>,
  /// Projects shown in the "my issues" view before any are saved
  #[serde(default)]
  pub projects: Vec<String>,
  /// Assign issues created from the tree to the acting user
  #[serde(default = "default_true")]
  pub assign_created_to_self: bool,
  /// Event loop tick in milliseconds
  #[serde(default = "default_tick_rate")]
  pub tick_rate_ms: u64,
}

fn default_true() -> bool {
  true
}

fn default_tick_rate() -> u64 {
  250
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
  /// Auto-detect based on URL: .atlassian.net = cloud, else on-premise
  #[default]
  Auto,
  /// Jira Cloud - uses Basic auth (email + API token as password)
  Cloud,
  /// Jira On-premise - uses Bearer auth (PAT)
  Onpremise,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
  pub url: String,
  pub email: String,
  /// Authentication type: auto, cloud, or onpremise
  #[serde(default)]
  pub auth_type: AuthType,
  /// Custom field holding story points
  #[serde(default = "default_story_points_field")]
  pub story_points_field: String,
}

fn default_story_points_field() -> String {
  "customfield_10016".to_string()
}

impl JiraConfig {
  /// Resolve `auto` to a concrete auth type from the URL host
  pub fn resolved_auth_type(&self) -> AuthType {
    match self.auth_type {
      AuthType::Auto => {
        let cloud = Url::parse(&self.url)
          .ok()
          .and_then(|u| u.host_str().map(|h| h.ends_with(".atlassian.net")))
          .unwrap_or(false);
        if cloud {
          AuthType::Cloud
        } else {
          AuthType::Onpremise
        }
      }
      other => other,
    }
  }

  /// Host name shown in the header
  pub fn domain(&self) -> String {
    Url::parse(&self.url)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.url.clone())
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jtree.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jtree/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/jtree/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("jtree.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jtree").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;

    Url::parse(&config.jira.url).map_err(|e| eyre!("jira.url is not a valid URL: {}", e))?;

    Ok(config)
  }

  /// Get the Jira API token from environment variables.
  ///
  /// Checks JTREE_JIRA_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("JTREE_JIRA_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Jira API token not found. Set JTREE_JIRA_TOKEN or JIRA_API_TOKEN environment variable."
        )
      })
  }
}
