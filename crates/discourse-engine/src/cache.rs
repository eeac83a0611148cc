//! # Result Cache
//!
//! Memoizes resolved rows per `(entity, label, target type label)`.
//!
//! Entries never expire on their own: they live until evicted, superseded
//! by a fresh resolution, or the engine is dropped. Callers that want a
//! freshness window check [`CacheEntry::is_fresh`] themselves (see the
//! overlay module).

use discourse_core::{EntityId, ResultRow};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache key. `label` is the label of the group the rows belong to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub entity: EntityId,
    pub label: String,
    pub target_type_label: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(entity: &EntityId, label: &str, target_type_label: &str) -> Self {
        Self {
            entity: entity.clone(),
            label: label.to_string(),
            target_type_label: target_type_label.to_string(),
        }
    }
}

/// A cached row map plus its creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub results: BTreeMap<EntityId, ResultRow>,
    pub created_at: Instant,
}

impl CacheEntry {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[must_use]
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() <= window
    }
}

/// Shared result cache.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<BTreeMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store rows under `key`, replacing any previous entry.
    pub async fn insert(&self, key: CacheKey, results: BTreeMap<EntityId, ResultRow>) {
        let entry = CacheEntry {
            results,
            created_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn evict(&self, key: &CacheKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every entry for one entity. Returns how many were removed.
    pub async fn evict_entity(&self, entity: &EntityId) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| &key.entity != entity);
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
