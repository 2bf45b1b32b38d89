//! In-memory store of fetched view results.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use super::key::{CacheKey, ViewKind};
use crate::jira::types::IssueRecord;

/// A cached result set and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub records: Vec<IssueRecord>,
  pub cached_at: DateTime<Utc>,
}

/// Indicates where rendered data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from a previous fetch of the same key
  Cache(DateTime<Utc>),
}

/// Result sets keyed by view, filter and visibility.
///
/// Entries have no expiry and no size bound; they live until invalidated.
#[derive(Debug, Default)]
pub struct ViewCache {
  entries: HashMap<CacheKey, CacheEntry>,
}

impl ViewCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
    let entry = self.entries.get(key);
    debug!(key = %key, hit = entry.is_some(), "cache lookup");
    entry
  }

  /// Store `records`, replacing any previous entry
  pub fn put(&mut self, key: CacheKey, records: Vec<IssueRecord>) {
    debug!(key = %key, records = records.len(), "cache put");
    self.entries.insert(
      key,
      CacheEntry {
        records,
        cached_at: Utc::now(),
      },
    );
  }

  pub fn invalidate(&mut self, key: &CacheKey) {
    if self.entries.remove(key).is_some() {
      debug!(key = %key, "cache invalidate");
    }
  }

  /// Drop every entry of one view kind, whatever its scope or filter
  pub fn invalidate_kind(&mut self, kind: ViewKind) {
    let before = self.entries.len();
    self.entries.retain(|key, _| key.kind() != kind);
    debug!(?kind, removed = before - self.entries.len(), "cache invalidate kind");
  }

  pub fn invalidate_all(&mut self) {
    debug!(removed = self.entries.len(), "cache clear");
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
