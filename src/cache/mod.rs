//! Keyed cache of fetched view results with explicit invalidation.
//!
//! Keys are derived from the view identity, the active filter text and the
//! resolved-visibility setting. Nothing expires on its own.

mod key;
mod store;

pub use key::{CacheKey, Scope, ViewKind, ViewTarget};
pub use store::{CacheEntry, CacheSource, ViewCache};
