//! Persistent generation cache for genforge
//!
//! Built around three pieces: a deterministic [`keys`] builder that digests
//! a task's semantic inputs, a [`store`] that persists results with TTL
//! expiry and least-recently-accessed eviction, and an [`executor`]
//! decorator that wraps an opaque generation backend with cache reads and
//! writes.

pub mod atomic;
pub mod entry;
pub mod executor;
pub mod keys;
pub mod store;

pub use entry::{CacheEntry, CacheLookup, CacheStats, DEFAULT_TTL_SECONDS};
pub use executor::{CachedGenerator, Generator};
pub use keys::{
    build_key, content_hash, dependency_hash, key_for_context, DEPENDENCIES_METADATA_KEY,
};
pub use store::{GenerationCacheStore, PutRequest, StoreConfig, DEFAULT_MAX_ENTRIES};
