//! Cache entry metadata and lookup outcomes

use crate::keys::DEPENDENCIES_METADATA_KEY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default entry time-to-live: 7 days
pub const DEFAULT_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Metadata record for one cached generation result
///
/// File contents live on disk under the entry's key-scoped directory; the
/// index only carries the relative paths and sizes needed for lookup,
/// eviction, and self-healing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key; globally unique per distinct input set
    pub key: String,
    /// Id of the task that produced this entry
    pub task_id: String,
    /// Hash of the task's own specification
    pub content_hash: String,
    /// Hash of the combined dependency outputs at caching time
    pub dependency_hash: String,
    /// Relative paths of the persisted files
    pub files: Vec<String>,
    /// Total size of the persisted files in bytes
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    /// Monotonically increasing hit counter
    pub hit_count: u64,
    /// Free-form metadata; carries the dependency-id list used for
    /// reverse invalidation lookups
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CacheEntry {
    /// Whether this entry's TTL has elapsed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.num_seconds() >= 0 && age.num_seconds() as u64 >= self.ttl_seconds
    }

    /// Record a hit: bump the access timestamp and counter
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.accessed_at = now;
        self.hit_count += 1;
    }

    /// Dependency ids recorded at caching time, if any
    pub fn dependency_ids(&self) -> Vec<String> {
        self.metadata
            .get(DEPENDENCIES_METADATA_KEY)
            .map(|joined| {
                joined
                    .split(',')
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// Fresh entry with a matching dependency hash
    Hit { entry: CacheEntry },
    /// No usable entry
    Miss { reason: String },
    /// Entry exists but its TTL has elapsed; returned for inspection only
    Stale { entry: CacheEntry, reason: String },
    /// Entry exists and is fresh, but an upstream dependency's output changed
    Invalid { entry: CacheEntry, reason: String },
}

impl CacheLookup {
    /// Whether the lookup produced a usable entry
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit { .. })
    }

    /// The entry, for any outcome that carries one
    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            CacheLookup::Hit { entry } => Some(entry),
            CacheLookup::Stale { entry, .. } | CacheLookup::Invalid { entry, .. } => Some(entry),
            CacheLookup::Miss { .. } => None,
        }
    }

    /// Human-readable reason for any non-hit outcome
    pub fn reason(&self) -> Option<&str> {
        match self {
            CacheLookup::Hit { .. } => None,
            CacheLookup::Miss { reason }
            | CacheLookup::Stale { reason, .. }
            | CacheLookup::Invalid { reason, .. } => Some(reason),
        }
    }
}

/// Aggregate store counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub hit_rate: f64,
    pub disk_usage: u64,
}
