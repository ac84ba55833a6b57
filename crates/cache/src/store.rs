//! Persistent generation cache store
//!
//! The store keeps a wholesale-loaded JSON index of entry metadata next to a
//! per-key directory tree holding each entry's output files verbatim. All
//! mutation goes through a single write lock so concurrent tasks cannot
//! evict or overwrite each other's entries mid-operation, and the index is
//! only replaced in memory after its new on-disk image has been persisted
//! atomically. A crash between a file write and the index write leaves an
//! orphan directory at worst; an index record whose backing files are gone
//! is purged on the next lookup.

use crate::atomic::write_atomic_json;
use crate::entry::{CacheEntry, CacheLookup, CacheStats, DEFAULT_TTL_SECONDS};
use chrono::Utc;
use genforge_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Default capacity bound for the entry index
pub const DEFAULT_MAX_ENTRIES: usize = 100;

const INDEX_FILE: &str = "index.json";
const ENTRIES_DIR: &str = "entries";

/// Store construction parameters
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for the index document and entry sub-trees
    pub base_dir: PathBuf,
    /// Capacity bound; 0 disables eviction
    pub max_entries: usize,
    /// TTL applied when a put does not specify one
    pub default_ttl_seconds: u64,
}

impl StoreConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub fn with_default_ttl(mut self, ttl_seconds: u64) -> Self {
        self.default_ttl_seconds = ttl_seconds;
        self
    }
}

/// Arguments for [`GenerationCacheStore::put`]
#[derive(Debug)]
pub struct PutRequest<'a> {
    pub key: &'a str,
    pub task_id: &'a str,
    pub content_hash: &'a str,
    pub dependency_hash: &'a str,
    pub files: &'a HashMap<String, String>,
    pub ttl_seconds: Option<u64>,
    pub metadata: HashMap<String, String>,
}

/// Persistent key -> entry store with TTL expiry and LRU eviction
pub struct GenerationCacheStore {
    base_dir: PathBuf,
    entries_dir: PathBuf,
    max_entries: usize,
    default_ttl_seconds: u64,
    index: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl GenerationCacheStore {
    /// Open a store at the configured directory, loading any existing index
    ///
    /// A missing index starts empty; a corrupt or unreadable one is logged
    /// and discarded rather than failing startup.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let entries_dir = config.base_dir.join(ENTRIES_DIR);
        fs::create_dir_all(&entries_dir)
            .map_err(|e| Error::file_system(&entries_dir, "create cache entries directory", e))?;

        let store = Self {
            base_dir: config.base_dir,
            entries_dir,
            max_entries: config.max_entries,
            default_ttl_seconds: config.default_ttl_seconds,
            index: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        };

        store.load_index();
        Ok(store)
    }

    /// Look up an entry by key
    ///
    /// When `expected_dependency_hash` is supplied and differs from the
    /// stored one, the entry is reported [`CacheLookup::Invalid`]. A fresh
    /// matching entry whose backing files have vanished from disk is purged
    /// from the index and reported as a miss.
    pub fn get(&self, key: &str, expected_dependency_hash: Option<&str>) -> CacheLookup {
        let now = Utc::now();
        let mut index = self.index.write();

        let Some(entry) = index.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Miss {
                reason: "not cached".to_string(),
            };
        };

        if !self.files_present(entry) {
            debug!(key, "cache entry lost its backing files, purging index record");
            index.remove(key);
            if let Err(e) = self.persist_index(&index) {
                warn!(key, error = %e, "failed to persist index after purging entry");
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Miss {
                reason: "cached files missing from storage".to_string(),
            };
        }

        if entry.is_expired(now) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Stale {
                entry: entry.clone(),
                reason: "cache entry expired".to_string(),
            };
        }

        if let Some(expected) = expected_dependency_hash {
            if expected != entry.dependency_hash {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return CacheLookup::Invalid {
                    entry: entry.clone(),
                    reason: format!(
                        "dependency outputs changed since task '{}' was cached",
                        entry.task_id
                    ),
                };
            }
        }

        let entry = index.get_mut(key).expect("entry checked above");
        entry.touch(now);
        let snapshot = entry.clone();
        if let Err(e) = self.persist_index(&index) {
            warn!(key, error = %e, "failed to persist index after cache hit");
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Hit { entry: snapshot }
    }

    /// Read an entry's metadata without touching access bookkeeping
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.index.read().get(key).cloned()
    }

    /// Persist a generation result under `key`, evicting as needed
    ///
    /// Either the whole write succeeds (files on disk, index updated and
    /// persisted) or the in-memory index is left exactly as it was.
    pub fn put(&self, request: PutRequest<'_>) -> Result<CacheEntry> {
        let sanitized = sanitize_files(request.key, request.files)?;
        let now = Utc::now();

        let mut index = self.index.write();
        let mut next = index.clone();

        // Select eviction victims before growing past the capacity bound;
        // overwriting an existing key does not grow the index.
        let mut evicted = Vec::new();
        if self.max_entries > 0 && !next.contains_key(request.key) {
            while next.len() >= self.max_entries {
                let Some(victim) = least_recently_accessed(&next) else {
                    break;
                };
                if let Some(entry) = next.remove(&victim) {
                    evicted.push(entry);
                }
            }
        }

        let entry_dir = self.entry_dir(request.key);
        if entry_dir.exists() {
            fs::remove_dir_all(&entry_dir)
                .map_err(|e| Error::file_system(&entry_dir, "clear previous cache entry", e))?;
        }

        let mut size_bytes = 0u64;
        let write_result = (|| -> Result<()> {
            for (relative, content) in &sanitized {
                let target = entry_dir.join(relative);
                crate::atomic::write_atomic(&target, content.as_bytes())?;
                size_bytes += content.len() as u64;
            }
            Ok(())
        })();
        if let Err(e) = write_result {
            let _ = fs::remove_dir_all(&entry_dir);
            return Err(e);
        }

        let entry = CacheEntry {
            key: request.key.to_string(),
            task_id: request.task_id.to_string(),
            content_hash: request.content_hash.to_string(),
            dependency_hash: request.dependency_hash.to_string(),
            files: sanitized
                .iter()
                .map(|(relative, _)| relative.to_string_lossy().to_string())
                .collect(),
            size_bytes,
            created_at: now,
            accessed_at: now,
            ttl_seconds: request.ttl_seconds.unwrap_or(self.default_ttl_seconds),
            hit_count: 0,
            metadata: request.metadata,
        };
        next.insert(request.key.to_string(), entry.clone());

        if let Err(e) = self.persist_index(&next) {
            // Index stays as it was; the files written above are orphaned
            // and will read as absent on the next lookup.
            let _ = fs::remove_dir_all(&entry_dir);
            return Err(e);
        }

        *index = next;
        drop(index);

        for victim in evicted {
            debug!(key = %victim.key, task_id = %victim.task_id, "evicting least recently accessed entry");
            self.remove_entry_dir(&victim.key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        Ok(entry)
    }

    /// Load an entry's files back from durable storage
    pub fn load_files(&self, entry: &CacheEntry) -> Result<HashMap<String, String>> {
        let entry_dir = self.entry_dir(&entry.key);
        let mut files = HashMap::with_capacity(entry.files.len());
        for relative in &entry.files {
            let path = entry_dir.join(relative);
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::file_system(&path, "read cached file", e))?;
            files.insert(relative.clone(), content);
        }
        Ok(files)
    }

    /// Remove one entry by key
    pub fn invalidate(&self, key: &str) -> bool {
        let mut index = self.index.write();
        let Some(_removed) = index.remove(key) else {
            return false;
        };
        if let Err(e) = self.persist_index(&index) {
            warn!(key, error = %e, "failed to persist index after invalidation");
        }
        drop(index);

        self.remove_entry_dir(key);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Remove every entry owned by `task_id`, returning the count
    pub fn invalidate_by_task(&self, task_id: &str) -> usize {
        self.invalidate_where(|entry| entry.task_id == task_id)
    }

    /// Remove every entry whose recorded dependency list names `dependency_id`
    ///
    /// This is a reverse scan over entry metadata: the dependency list is
    /// owned by the dependent, so the store walks all entries rather than a
    /// forward index.
    pub fn invalidate_by_dependency(&self, dependency_id: &str) -> usize {
        self.invalidate_where(|entry| {
            entry
                .dependency_ids()
                .iter()
                .any(|id| id == dependency_id)
        })
    }

    /// Remove every entry whose TTL has elapsed, returning the count
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        self.invalidate_where(|entry| entry.is_expired(now))
    }

    /// Remove all entries, returning the count
    pub fn clear(&self) -> usize {
        let mut index = self.index.write();
        let removed: Vec<String> = index.keys().cloned().collect();
        index.clear();
        if let Err(e) = self.persist_index(&index) {
            warn!(error = %e, "failed to persist index after clear");
        }
        drop(index);

        for key in &removed {
            self.remove_entry_dir(key);
        }
        self.invalidations
            .fetch_add(removed.len() as u64, Ordering::Relaxed);
        removed.len()
    }

    /// Aggregate counters for observability
    pub fn stats(&self) -> CacheStats {
        let index = self.index.read();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            entries: index.len(),
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            disk_usage: index.values().map(|entry| entry.size_bytes).sum(),
        }
    }

    fn invalidate_where(&self, predicate: impl Fn(&CacheEntry) -> bool) -> usize {
        let mut index = self.index.write();
        let victims: Vec<String> = index
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &victims {
            index.remove(key);
        }
        if !victims.is_empty() {
            if let Err(e) = self.persist_index(&index) {
                warn!(error = %e, "failed to persist index after bulk invalidation");
            }
        }
        drop(index);

        for key in &victims {
            self.remove_entry_dir(key);
        }
        self.invalidations
            .fetch_add(victims.len() as u64, Ordering::Relaxed);
        victims.len()
    }

    fn entry_dir(&self, key: &str) -> PathBuf {
        self.entries_dir.join(key)
    }

    fn files_present(&self, entry: &CacheEntry) -> bool {
        let entry_dir = self.entry_dir(&entry.key);
        entry.files.iter().all(|relative| entry_dir.join(relative).is_file())
    }

    fn remove_entry_dir(&self, key: &str) {
        let dir = self.entry_dir(key);
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!(key, error = %e, "failed to remove cache entry directory");
            }
        }
    }

    fn load_index(&self) {
        let index_path = self.base_dir.join(INDEX_FILE);
        if !index_path.exists() {
            return;
        }

        let loaded = fs::read_to_string(&index_path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<HashMap<String, CacheEntry>>(&content)
                    .map_err(|e| e.to_string())
            });

        match loaded {
            Ok(entries) => {
                debug!(entries = entries.len(), "loaded cache index");
                *self.index.write() = entries;
            }
            Err(e) => {
                warn!(path = %index_path.display(), error = %e, "failed to load cache index, starting empty");
            }
        }
    }

    fn persist_index(&self, index: &HashMap<String, CacheEntry>) -> Result<()> {
        write_atomic_json(&self.base_dir.join(INDEX_FILE), index)
    }
}

/// Eviction victim: oldest `accessed_at`, ties broken by key order
fn least_recently_accessed(index: &HashMap<String, CacheEntry>) -> Option<String> {
    index
        .values()
        .min_by(|a, b| {
            a.accessed_at
                .cmp(&b.accessed_at)
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|entry| entry.key.clone())
}

/// Reject any relative path that would escape the entry's namespace
fn sanitize_files<'a>(
    key: &str,
    files: &'a HashMap<String, String>,
) -> Result<Vec<(PathBuf, &'a String)>> {
    let mut sanitized = Vec::with_capacity(files.len());
    for (path, content) in files {
        sanitized.push((sanitize_relative_path(key, path)?, content));
    }
    // Stable order so repeated puts of the same map write identically.
    sanitized.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(sanitized)
}

fn sanitize_relative_path(key: &str, path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::cache(
                    key,
                    format!("unsafe file path '{path}' rejected"),
                ));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(Error::cache(key, format!("empty file path '{path}' rejected")));
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::DEPENDENCIES_METADATA_KEY;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> GenerationCacheStore {
        GenerationCacheStore::open(StoreConfig::new(dir.path())).unwrap()
    }

    fn files(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn put_entry(store: &GenerationCacheStore, key: &str, content: &HashMap<String, String>) {
        store
            .put(PutRequest {
                key,
                task_id: "t1",
                content_hash: "c1",
                dependency_hash: "d1",
                files: content,
                ttl_seconds: None,
                metadata: HashMap::new(),
            })
            .unwrap();
    }

    #[test]
    fn test_put_then_get_round_trips_files() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let content = files(&[("src/lib.rs", "pub fn f() {}"), ("README.md", "# out")]);

        put_entry(&store, "k1", &content);

        let lookup = store.get("k1", None);
        assert!(lookup.is_hit());
        let entry = lookup.entry().unwrap();
        assert_eq!(entry.hit_count, 1);

        let loaded = store.load_files(entry).unwrap();
        assert_eq!(loaded, content);
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let lookup = store.get("absent", None);
        assert!(matches!(lookup, CacheLookup::Miss { .. }));
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_dependency_hash_mismatch_is_invalid() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        put_entry(&store, "k1", &files(&[("a.rs", "A")]));

        let lookup = store.get("k1", Some("other-hash"));
        assert!(matches!(lookup, CacheLookup::Invalid { .. }));
        assert!(lookup.reason().unwrap().contains("dependency outputs changed"));

        // Matching hash is still a hit.
        assert!(store.get("k1", Some("d1")).is_hit());
    }

    #[test]
    fn test_zero_ttl_entry_reads_stale() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .put(PutRequest {
                key: "k1",
                task_id: "t1",
                content_hash: "c1",
                dependency_hash: "d1",
                files: &files(&[("a.rs", "A")]),
                ttl_seconds: Some(0),
                metadata: HashMap::new(),
            })
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        let lookup = store.get("k1", None);
        assert!(matches!(lookup, CacheLookup::Stale { .. }));
        assert_eq!(lookup.reason(), Some("cache entry expired"));
    }

    #[test]
    fn test_missing_backing_files_self_heal_to_miss() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        put_entry(&store, "k1", &files(&[("a.rs", "A")]));

        fs::remove_dir_all(dir.path().join("entries").join("k1")).unwrap();

        let lookup = store.get("k1", None);
        assert!(matches!(lookup, CacheLookup::Miss { .. }));
        // Record purged: second lookup reports a plain miss too.
        assert!(matches!(store.get("k1", None), CacheLookup::Miss { .. }));
        assert_eq!(store.stats().entries, 0);
    }

    #[test]
    fn test_eviction_removes_least_recently_accessed() {
        let dir = TempDir::new().unwrap();
        let store = GenerationCacheStore::open(
            StoreConfig::new(dir.path()).with_max_entries(2),
        )
        .unwrap();

        put_entry(&store, "k1", &files(&[("a.rs", "A")]));
        put_entry(&store, "k2", &files(&[("b.rs", "B")]));

        // Touch k1 so k2 becomes the eviction victim.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.get("k1", None).is_hit());

        put_entry(&store, "k3", &files(&[("c.rs", "C")]));

        assert!(store.peek("k1").is_some());
        assert!(store.peek("k2").is_none());
        assert!(store.peek("k3").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_same_key_does_not_evict() {
        let dir = TempDir::new().unwrap();
        let store = GenerationCacheStore::open(
            StoreConfig::new(dir.path()).with_max_entries(2),
        )
        .unwrap();

        put_entry(&store, "k1", &files(&[("a.rs", "A")]));
        put_entry(&store, "k2", &files(&[("b.rs", "B")]));
        put_entry(&store, "k1", &files(&[("a.rs", "A2")]));

        assert_eq!(store.stats().entries, 2);
        assert_eq!(store.stats().evictions, 0);

        let entry = store.peek("k1").unwrap();
        let loaded = store.load_files(&entry).unwrap();
        assert_eq!(loaded.get("a.rs").unwrap(), "A2");
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let result = store.put(PutRequest {
            key: "k1",
            task_id: "t1",
            content_hash: "c1",
            dependency_hash: "d1",
            files: &files(&[("../escape.rs", "bad")]),
            ttl_seconds: None,
            metadata: HashMap::new(),
        });
        assert!(result.is_err());
        assert_eq!(store.stats().entries, 0);

        let absolute = store.put(PutRequest {
            key: "k1",
            task_id: "t1",
            content_hash: "c1",
            dependency_hash: "d1",
            files: &files(&[("/etc/passwd", "bad")]),
            ttl_seconds: None,
            metadata: HashMap::new(),
        });
        assert!(absolute.is_err());
    }

    #[test]
    fn test_invalidate_by_task_and_key() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .put(PutRequest {
                key: "k1",
                task_id: "alpha",
                content_hash: "c1",
                dependency_hash: "d1",
                files: &files(&[("a.rs", "A")]),
                ttl_seconds: None,
                metadata: HashMap::new(),
            })
            .unwrap();
        store
            .put(PutRequest {
                key: "k2",
                task_id: "alpha",
                content_hash: "c2",
                dependency_hash: "d2",
                files: &files(&[("b.rs", "B")]),
                ttl_seconds: None,
                metadata: HashMap::new(),
            })
            .unwrap();
        store
            .put(PutRequest {
                key: "k3",
                task_id: "beta",
                content_hash: "c3",
                dependency_hash: "d3",
                files: &files(&[("c.rs", "C")]),
                ttl_seconds: None,
                metadata: HashMap::new(),
            })
            .unwrap();

        assert_eq!(store.invalidate_by_task("alpha"), 2);
        assert_eq!(store.stats().entries, 1);

        assert!(store.invalidate("k3"));
        assert!(!store.invalidate("k3"));
        assert_eq!(store.stats().entries, 0);
    }

    #[test]
    fn test_invalidate_by_dependency_scans_metadata() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut metadata = HashMap::new();
        metadata.insert(DEPENDENCIES_METADATA_KEY.to_string(), "dep1,dep2".to_string());
        store
            .put(PutRequest {
                key: "k1",
                task_id: "t1",
                content_hash: "c1",
                dependency_hash: "d1",
                files: &files(&[("a.rs", "A")]),
                ttl_seconds: None,
                metadata,
            })
            .unwrap();

        store
            .put(PutRequest {
                key: "k2",
                task_id: "t2",
                content_hash: "c2",
                dependency_hash: "d2",
                files: &files(&[("b.rs", "B")]),
                ttl_seconds: None,
                metadata: HashMap::new(),
            })
            .unwrap();

        assert_eq!(store.invalidate_by_dependency("dep1"), 1);
        assert!(store.peek("k1").is_none());
        assert!(store.peek("k2").is_some());
    }

    #[test]
    fn test_cleanup_expired_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .put(PutRequest {
                key: "old",
                task_id: "t1",
                content_hash: "c1",
                dependency_hash: "d1",
                files: &files(&[("a.rs", "A")]),
                ttl_seconds: Some(0),
                metadata: HashMap::new(),
            })
            .unwrap();
        put_entry(&store, "fresh", &files(&[("b.rs", "B")]));

        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.peek("old").is_none());
        assert!(store.peek("fresh").is_some());

        assert_eq!(store.clear(), 1);
        assert_eq!(store.stats().entries, 0);
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let content = files(&[("a.rs", "A")]);
        {
            let store = open_store(&dir);
            put_entry(&store, "k1", &content);
        }

        let reopened = open_store(&dir);
        let lookup = reopened.get("k1", None);
        assert!(lookup.is_hit());
        assert_eq!(
            reopened.load_files(lookup.entry().unwrap()).unwrap(),
            content
        );
    }

    #[test]
    fn test_corrupt_index_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.json"), "{not json").unwrap();

        let store = open_store(&dir);
        assert_eq!(store.stats().entries, 0);
    }

    #[test]
    fn test_stats_hit_rate() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        put_entry(&store, "k1", &files(&[("a.rs", "A")]));

        assert!(store.get("k1", None).is_hit());
        store.get("nope", None);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
        assert!(stats.disk_usage > 0);
    }
}
