pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// User state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
  /// Projects included in the cross-project "my issues" view
  pub saved_project_scopes: Vec<String>,
  /// Hide resolved issues in every view
  pub hide_resolved: bool,
  /// Last ad-hoc query that was run
  pub last_query: Option<String>,
}

/// Trait for preference storage backends.
pub trait PreferenceStore: Send {
  fn load(&self) -> Result<Preferences>;

  fn save(&self, prefs: &Preferences) -> Result<()>;
}

/// Storage that remembers nothing.
/// Used when the database cannot be opened.
pub struct NoopPreferences;

impl PreferenceStore for NoopPreferences {
  fn load(&self) -> Result<Preferences> {
    Ok(Preferences::default())
  }

  fn save(&self, _prefs: &Preferences) -> Result<()> {
    Ok(()) // Discard
  }
}

const SCOPES: &str = "saved_project_scopes";
const HIDE_RESOLVED: &str = "hide_resolved";
const LAST_QUERY: &str = "last_query";

/// SQLite-backed preference storage
pub struct SqlitePreferences {
  conn: Mutex<Connection>,
}

impl SqlitePreferences {
  /// Open or create the database at the default location
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Wrap an existing connection, running migrations on it
  pub fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(schema::SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("jtree").join("state.db"))
  }

  fn read<T: for<'de> Deserialize<'de>>(conn: &Connection, name: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
      .query_row(
        "SELECT value FROM preferences WHERE name = ?",
        params![name],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read preference {}: {}", name, e))?;

    match raw {
      Some(raw) => serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| eyre!("Failed to parse preference {}: {}", name, e)),
      None => Ok(None),
    }
  }

  fn write<T: Serialize>(conn: &Connection, name: &str, value: &T) -> Result<()> {
    let raw =
      serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize {}: {}", name, e))?;
    conn
      .execute(
        "INSERT OR REPLACE INTO preferences (name, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![name, raw],
      )
      .map_err(|e| eyre!("Failed to store preference {}: {}", name, e))?;
    Ok(())
  }
}

impl PreferenceStore for SqlitePreferences {
  fn load(&self) -> Result<Preferences> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(Preferences {
      saved_project_scopes: Self::read(&conn, SCOPES)?.unwrap_or_default(),
      hide_resolved: Self::read(&conn, HIDE_RESOLVED)?.unwrap_or_default(),
      last_query: Self::read::<Option<String>>(&conn, LAST_QUERY)?.flatten(),
    })
  }

  fn save(&self, prefs: &Preferences) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let result = Self::write(&conn, SCOPES, &prefs.saved_project_scopes)
      .and_then(|_| Self::write(&conn, HIDE_RESOLVED, &prefs.hide_resolved))
      .and_then(|_| Self::write(&conn, LAST_QUERY, &prefs.last_query));

    let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
    conn
      .execute(finish, [])
      .map_err(|e| eyre!("Failed to finish transaction: {}", e))?;

    result
  }
}
