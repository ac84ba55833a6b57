//! Caching decorator over the generation backend
//!
//! [`CachedGenerator`] wraps an opaque [`Generator`] with cache reads and
//! writes. Identical executions arriving concurrently are de-duplicated
//! through an in-flight notify map so at most one backend call runs per
//! cache key at any time; waiters re-read the cache once the first caller
//! finishes.

use crate::entry::CacheLookup;
use crate::keys::{self, DEPENDENCIES_METADATA_KEY};
use crate::store::{GenerationCacheStore, PutRequest};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use genforge_core::{GenerationContext, GenerationResult, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Opaque generation backend
///
/// Implementations must be safe to call concurrently up to the scheduler's
/// pool bound and must not mutate the supplied context.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, ctx: &GenerationContext) -> Result<GenerationResult>;

    /// Whether the backend tolerates concurrent invocations
    fn supports_parallel(&self) -> bool {
        true
    }
}

/// Backend wrapper that consults the cache store before generating
pub struct CachedGenerator {
    backend: Arc<dyn Generator>,
    store: Arc<GenerationCacheStore>,
    in_flight: DashMap<String, Arc<Notify>>,
}

impl CachedGenerator {
    pub fn new(backend: Arc<dyn Generator>, store: Arc<GenerationCacheStore>) -> Self {
        Self {
            backend,
            store,
            in_flight: DashMap::new(),
        }
    }

    /// Access to the wrapped store, for observability surfaces
    pub fn store(&self) -> &GenerationCacheStore {
        &self.store
    }

    /// Whether the wrapped backend tolerates concurrent invocations
    pub fn supports_parallel(&self) -> bool {
        self.backend.supports_parallel()
    }

    /// Execute one generation, serving it from the cache when possible
    ///
    /// `dependency_outputs` feeds the dependency hash; when `force` is set
    /// the cache read is skipped but a successful result is still written
    /// back. Failed backend results are never cached.
    pub async fn execute(
        &self,
        ctx: &GenerationContext,
        dependency_outputs: Option<&HashMap<String, HashMap<String, String>>>,
        force: bool,
    ) -> Result<GenerationResult> {
        let key = keys::key_for_context(ctx);
        let expected_hash =
            dependency_outputs.map(|outputs| keys::dependency_hash(&ctx.dependencies, outputs));

        // Claim the key, or wait for whoever holds it and re-read the cache.
        let claimed = loop {
            if !force {
                if let Some(result) = self.from_cache(&key, expected_hash.as_deref()) {
                    return Ok(result);
                }
            }

            let notify = Arc::new(Notify::new());
            match self.in_flight.entry(key.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::clone(&notify));
                    break notify;
                }
                Entry::Occupied(occupied) => {
                    let waiter = Arc::clone(occupied.get());
                    drop(occupied);
                    debug!(key = %key, task_id = %ctx.task_id, "waiting on in-flight generation for same key");
                    let notified = waiter.notified();
                    tokio::pin!(notified);
                    // Register before re-checking liveness; the holder
                    // notifies only after removing itself from the map.
                    notified.as_mut().enable();
                    if self.in_flight.contains_key(&key) {
                        notified.await;
                    }
                }
            }
        };

        let outcome = self.backend.generate(ctx).await;
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.in_flight.remove(&key);
                claimed.notify_waiters();
                return Err(e);
            }
        };

        if result.success && !result.files.is_empty() {
            let dependency_hash = expected_hash.clone().unwrap_or_else(|| {
                keys::dependency_hash(&ctx.dependencies, &HashMap::new())
            });
            let mut metadata = HashMap::new();
            metadata.insert(
                DEPENDENCIES_METADATA_KEY.to_string(),
                ctx.dependencies.join(","),
            );

            let put = self.store.put(PutRequest {
                key: &key,
                task_id: &ctx.task_id,
                content_hash: &keys::content_hash(&ctx.specification),
                dependency_hash: &dependency_hash,
                files: &result.files,
                ttl_seconds: None,
                metadata,
            });
            match put {
                Ok(entry) => {
                    debug!(key = %key, task_id = %ctx.task_id, files = entry.files.len(), "cached generation result");
                }
                Err(e) => {
                    warn!(key = %key, task_id = %ctx.task_id, error = %e, "failed to cache generation result");
                }
            }
        }

        self.in_flight.remove(&key);
        claimed.notify_waiters();
        Ok(result)
    }

    /// Serve a hit from durable storage; any non-hit falls through to the
    /// backend, as does a hit whose files can no longer be read.
    fn from_cache(&self, key: &str, expected_hash: Option<&str>) -> Option<GenerationResult> {
        match self.store.get(key, expected_hash) {
            CacheLookup::Hit { entry } => match self.store.load_files(&entry) {
                Ok(files) => {
                    debug!(key, task_id = %entry.task_id, hits = entry.hit_count, "serving generation from cache");
                    Some(GenerationResult {
                        success: true,
                        files,
                        error: None,
                        duration_ms: 0,
                        from_cache: true,
                        cache_hits: Some(entry.hit_count),
                    })
                }
                Err(e) => {
                    warn!(key, error = %e, "cache hit but files unreadable, regenerating");
                    None
                }
            },
            lookup => {
                if let Some(reason) = lookup.reason() {
                    debug!(key, reason, "cache lookup not usable");
                }
                None
            }
        }
    }
}
