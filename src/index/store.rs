//! Keyed collection of built indexes.
//!
//! The store is the only holder of index state. It is constructed once at
//! startup and shared by the ingestion and answering pipelines.

use super::{StorePolicy, VectorIndex};
use crate::config::StoreSettings;
use crate::error::{DocqaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Build-lock key shared by every ingestion under the single-slot policy.
const SINGLE_SLOT_KEY: &str = "single-slot";

/// Opaque identifier of one ingested source's index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    /// A freshly generated unique handle.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocumentHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional bounds on how many indexes are kept and for how long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Keep at most this many indexes; the oldest-built are evicted first.
    pub max_entries: Option<usize>,
    /// Indexes older than this are invisible to lookups and purged on the next write.
    pub ttl: Option<Duration>,
}

impl From<&StoreSettings> for EvictionPolicy {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            max_entries: settings.max_entries,
            ttl: settings.ttl_seconds.map(Duration::from_secs),
        }
    }
}

/// Summary of a stored index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub handle: DocumentHandle,
    pub passages: usize,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
    pub is_default: bool,
}

struct StoredIndex {
    index: Arc<VectorIndex>,
    built_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<DocumentHandle, StoredIndex>,
    default: Option<DocumentHandle>,
}

/// Held while an index is being built; serializes builds sharing a key.
pub struct BuildGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Mapping from document handle to vector index, plus a "most recent" default.
pub struct IndexStore {
    policy: StorePolicy,
    eviction: EvictionPolicy,
    state: RwLock<StoreState>,
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IndexStore {
    pub fn new(policy: StorePolicy, eviction: EvictionPolicy) -> Self {
        Self {
            policy,
            eviction,
            state: RwLock::new(StoreState::default()),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(settings.policy, EvictionPolicy::from(settings))
    }

    pub fn policy(&self) -> StorePolicy {
        self.policy
    }

    /// Look up an index by handle.
    pub async fn get(&self, handle: &DocumentHandle) -> Result<Arc<VectorIndex>> {
        let state = self.state.read().await;
        let now = Utc::now();
        state
            .entries
            .get(handle)
            .filter(|stored| !self.is_expired(stored, now))
            .map(|stored| stored.index.clone())
            .ok_or_else(|| DocqaError::UnknownHandle(handle.to_string()))
    }

    /// Resolve an explicit handle, or the default when none is given.
    pub async fn resolve(
        &self,
        handle: Option<&DocumentHandle>,
    ) -> Result<(DocumentHandle, Arc<VectorIndex>)> {
        if let Some(handle) = handle {
            let index = self.get(handle).await?;
            return Ok((handle.clone(), index));
        }

        let state = self.state.read().await;
        let now = Utc::now();
        state
            .default
            .as_ref()
            .and_then(|handle| {
                state
                    .entries
                    .get(handle)
                    .filter(|stored| !self.is_expired(stored, now))
                    .map(|stored| (handle.clone(), stored.index.clone()))
            })
            .ok_or(DocqaError::NoIndex)
    }

    /// Whether a live index exists under `handle`.
    pub async fn contains(&self, handle: &DocumentHandle) -> bool {
        self.get(handle).await.is_ok()
    }

    /// The current default handle, if it still resolves.
    pub async fn default_handle(&self) -> Option<DocumentHandle> {
        self.resolve(None).await.ok().map(|(handle, _)| handle)
    }

    /// Store a fully built index under `handle` and make it the default.
    ///
    /// Under the single-slot policy every other entry is dropped; under the
    /// per-source policy only an entry with the same handle is replaced.
    pub async fn insert(&self, handle: DocumentHandle, index: VectorIndex) -> DocumentHandle {
        let mut state = self.state.write().await;
        let now = Utc::now();

        self.purge_expired(&mut state, now);

        if self.policy == StorePolicy::SingleSlot && !state.entries.is_empty() {
            debug!("Single-slot store: dropping {} previous index(es)", state.entries.len());
            state.entries.clear();
        }

        let passages = index.len();
        let replaced = state
            .entries
            .insert(
                handle.clone(),
                StoredIndex {
                    index: Arc::new(index),
                    built_at: now,
                },
            )
            .is_some();
        state.default = Some(handle.clone());

        self.enforce_capacity(&mut state, &handle);

        info!(
            handle = %handle,
            passages,
            replaced,
            entries = state.entries.len(),
            "Stored index"
        );

        handle
    }

    /// Evict the index stored under `handle`.
    pub async fn remove(&self, handle: &DocumentHandle) -> bool {
        let mut state = self.state.write().await;
        let removed = state.entries.remove(handle).is_some();
        if state.default.as_ref() == Some(handle) {
            state.default = None;
        }
        removed
    }

    /// Describe every live index, most recently built first.
    pub async fn list(&self) -> Vec<IndexInfo> {
        let state = self.state.read().await;
        let now = Utc::now();

        let mut infos: Vec<IndexInfo> = state
            .entries
            .iter()
            .filter(|(_, stored)| !self.is_expired(stored, now))
            .map(|(handle, stored)| IndexInfo {
                handle: handle.clone(),
                passages: stored.index.len(),
                embedding_model: stored.index.embedding_model().to_string(),
                built_at: stored.built_at,
                is_default: state.default.as_ref() == Some(handle),
            })
            .collect();

        infos.sort_by(|a, b| b.built_at.cmp(&a.built_at));
        infos
    }

    /// Number of live indexes.
    pub async fn len(&self) -> usize {
        self.list().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Serialize builds that would write the same slot.
    ///
    /// Under the single-slot policy all builds share one lock. Under the
    /// per-source policy builds with the same cache key share a lock and
    /// builds without a key proceed unserialized.
    pub async fn lock_for_build(&self, cache_key: Option<&str>) -> Option<BuildGuard> {
        let key = match (self.policy, cache_key) {
            (StorePolicy::SingleSlot, _) => SINGLE_SLOT_KEY,
            (StorePolicy::PerSource, Some(key)) => key,
            (StorePolicy::PerSource, None) => return None,
        };

        let lock = {
            let mut locks = self.build_locks.lock().await;
            // Locks nobody holds or waits on are only referenced by the map.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        Some(BuildGuard {
            _guard: lock.lock_owned().await,
        })
    }

    fn is_expired(&self, stored: &StoredIndex, now: DateTime<Utc>) -> bool {
        match self.eviction.ttl {
            Some(ttl) => {
                let age = now.signed_duration_since(stored.built_at);
                chrono::Duration::from_std(ttl).map_or(false, |ttl| age >= ttl)
            }
            None => false,
        }
    }

    fn purge_expired(&self, state: &mut StoreState, now: DateTime<Utc>) {
        if self.eviction.ttl.is_none() {
            return;
        }
        let before = state.entries.len();
        state.entries.retain(|_, stored| !self.is_expired(stored, now));
        if let Some(default) = &state.default {
            if !state.entries.contains_key(default) {
                state.default = None;
            }
        }
        let purged = before - state.entries.len();
        if purged > 0 {
            debug!("Purged {} expired index(es)", purged);
        }
    }

    fn enforce_capacity(&self, state: &mut StoreState, keep: &DocumentHandle) {
        let Some(max_entries) = self.eviction.max_entries else {
            return;
        };

        while state.entries.len() > max_entries {
            let oldest = state
                .entries
                .iter()
                .filter(|(handle, _)| *handle != keep)
                .min_by_key(|(_, stored)| stored.built_at)
                .map(|(handle, _)| handle.clone());

            match oldest {
                Some(handle) => {
                    debug!(handle = %handle, "Evicting oldest index");
                    state.entries.remove(&handle);
                }
                None => break,
            }
        }
    }
}
