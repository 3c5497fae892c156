//! Typed query cache.
//!
//! Entries are keyed by resource kind and scope and stored as JSON. A
//! mutation of one kind invalidates every kind reachable from it through
//! [`ResourceKind::dependents`].

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::ResourceKind;
use crate::models::PageQuery;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Failed to encode cache entry: {0}")]
    Encode(String),

    #[error("Failed to decode cache entry: {0}")]
    Decode(String),

    #[error("Cache lock poisoned: {0}")]
    Poisoned(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl<T> From<PoisonError<T>> for CacheError {
    fn from(e: PoisonError<T>) -> Self {
        CacheError::Poisoned(e.to_string())
    }
}

/// What part of a resource a cached query covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryScope {
    /// One record by ID
    Item(String),
    /// A list query, keyed by its normalized parameters
    List(String),
    /// A composite view (name, anchor ID)
    View(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: ResourceKind,
    pub scope: QueryScope,
}

impl QueryKey {
    pub fn item(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            scope: QueryScope::Item(id.into()),
        }
    }

    pub fn list(kind: ResourceKind, query: &PageQuery) -> Self {
        Self {
            kind,
            scope: QueryScope::List(query.cache_key()),
        }
    }

    pub fn view(kind: ResourceKind, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind,
            scope: QueryScope::View(name.into(), id.into()),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            QueryScope::Item(id) => write!(f, "{}/{}", self.kind, id),
            QueryScope::List(params) => write!(f, "{}?{}", self.kind, params),
            QueryScope::View(name, id) => write!(f, "{}:{}/{}", self.kind, name, id),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: DateTime<Utc>,
}

/// Every kind whose cached data may change when `kinds` are mutated,
/// including `kinds` themselves.
pub fn invalidation_set(kinds: &[ResourceKind]) -> BTreeSet<ResourceKind> {
    let mut seen: BTreeSet<ResourceKind> = BTreeSet::new();
    let mut pending: Vec<ResourceKind> = kinds.to_vec();
    while let Some(kind) = pending.pop() {
        if seen.insert(kind) {
            pending.extend(kind.dependents().iter().copied());
        }
    }
    seen
}

/// In-memory cache of backend reads.
///
/// The lock is never held across an await. Two concurrent misses on the
/// same key both fetch; the later write wins. Stale entries are pruned on
/// every write, and a zero `stale_after` stores nothing.
#[derive(Debug)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    fn entries(&self) -> CacheResult<MutexGuard<'_, HashMap<QueryKey, CacheEntry>>> {
        Ok(self.entries.lock()?)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.stored_at).to_std() {
            Ok(age) => age < self.stale_after,
            // stored "in the future" after a clock step back
            Err(_) => true,
        }
    }

    /// Fresh entry for `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> CacheResult<Option<T>> {
        self.get_at(key, Utc::now())
    }

    /// Like [`get`](Self::get), judged as of `now`.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        now: DateTime<Utc>,
    ) -> CacheResult<Option<T>> {
        let value = {
            let entries = self.entries()?;
            match entries.get(key) {
                Some(entry) if self.is_fresh(entry, now) => entry.value.clone(),
                _ => return Ok(None),
            }
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CacheError::Decode(e.to_string()))
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> CacheResult<()> {
        if self.stale_after.is_zero() {
            return Ok(());
        }
        let value = serde_json::to_value(value).map_err(|e| CacheError::Encode(e.to_string()))?;
        let now = Utc::now();
        let mut entries = self.entries()?;
        entries.retain(|_, entry| self.is_fresh(entry, now));
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
        Ok(())
    }

    /// Serve `key` from the cache while fresh, otherwise run `fetch` and
    /// store its result. Fetch errors are returned and not stored.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key)? {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }
        debug!(key = %key, "cache miss");
        let value = fetch().await?;
        self.put(key, &value)?;
        Ok(value)
    }

    /// Drop every entry of `kinds` and their transitive dependents.
    ///
    /// Returns the invalidated kinds in a stable order.
    pub fn invalidate(&self, kinds: &[ResourceKind]) -> CacheResult<Vec<ResourceKind>> {
        let set = invalidation_set(kinds);
        let removed = {
            let mut entries = self.entries()?;
            let before = entries.len();
            entries.retain(|key, _| !set.contains(&key.kind));
            before - entries.len()
        };
        debug!(kinds = ?set, removed, "cache invalidated");
        Ok(set.into_iter().collect())
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.entries()?.clear();
        Ok(())
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> CacheResult<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.entries()?.is_empty())
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
