//! End-to-end pipeline scenarios: scheduling, cache reuse across runs, and
//! incremental change detection against a populated store.

use async_trait::async_trait;
use genforge_cache::{CachedGenerator, GenerationCacheStore, Generator, StoreConfig};
use genforge_core::{GenerationContext, GenerationResult, Result, Task};
use genforge_task::{IncrementalBuildDetector, SchedulerConfig, TaskScheduler};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, ctx: &GenerationContext) -> Result<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut files = HashMap::new();
        files.insert(
            format!("src/{}.rs", ctx.task_id),
            format!("// generated from: {}", ctx.specification),
        );
        Ok(GenerationResult::success(files, 5))
    }
}

fn plan() -> Vec<Task> {
    vec![
        Task::new("t1", "shared model", "generate the shared data model"),
        Task::new("t2", "api layer", "generate the api layer")
            .with_dependencies(vec!["t1".to_string()]),
        Task::new("t3", "storage layer", "generate the storage layer")
            .with_dependencies(vec!["t1".to_string()]),
    ]
}

fn scheduler_at(
    backend: Arc<CountingGenerator>,
    cache_dir: &Path,
    max_parallel: usize,
) -> TaskScheduler {
    let store = Arc::new(GenerationCacheStore::open(StoreConfig::new(cache_dir)).unwrap());
    let executor = Arc::new(CachedGenerator::new(backend, store));
    TaskScheduler::new(
        executor,
        SchedulerConfig {
            max_parallel,
            project_context: "demo project".to_string(),
            ..SchedulerConfig::default()
        },
    )
}

#[tokio::test]
async fn second_run_is_fully_cache_sourced() {
    let cache_dir = TempDir::new().unwrap();
    let backend = CountingGenerator::new();

    let first = scheduler_at(Arc::clone(&backend), cache_dir.path(), 2)
        .run_all(plan())
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    assert!(first.values().all(|r| r.success));
    assert!(first.values().all(|r| !r.from_cache));
    assert_eq!(backend.calls(), 3);

    // Fresh scheduler and store over the same directory: everything is
    // served from disk with zero backend invocations.
    let second = scheduler_at(Arc::clone(&backend), cache_dir.path(), 2)
        .run_all(plan())
        .await
        .unwrap();
    assert_eq!(second.len(), 3);
    assert!(second.values().all(|r| r.success && r.from_cache));
    assert!(second.values().all(|r| r.duration_ms == 0));
    assert_eq!(backend.calls(), 3);

    for (task_id, result) in &second {
        assert_eq!(
            result.files,
            first[task_id].files,
            "cached files diverged for {task_id}"
        );
    }
}

#[tokio::test]
async fn detector_finds_nothing_after_a_clean_run() {
    let cache_dir = TempDir::new().unwrap();
    let backend = CountingGenerator::new();

    scheduler_at(Arc::clone(&backend), cache_dir.path(), 2)
        .run_all(plan())
        .await
        .unwrap();

    let store = Arc::new(GenerationCacheStore::open(StoreConfig::new(cache_dir.path())).unwrap());
    let detector = IncrementalBuildDetector::new(store, "demo project");
    let changes = detector.detect_changes(&plan()).unwrap();
    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}

#[tokio::test]
async fn upstream_spec_change_forces_dependent_rebuilds() {
    let cache_dir = TempDir::new().unwrap();
    let backend = CountingGenerator::new();

    scheduler_at(Arc::clone(&backend), cache_dir.path(), 2)
        .run_all(plan())
        .await
        .unwrap();

    // Only t1's specification changes.
    let mut updated = plan();
    updated[0].specification = "generate the shared data model, now with auditing".to_string();

    let store = Arc::new(GenerationCacheStore::open(StoreConfig::new(cache_dir.path())).unwrap());
    let detector = IncrementalBuildDetector::new(store, "demo project");
    let changes = detector.detect_changes(&updated).unwrap();

    assert_eq!(changes.get("t1").map(String::as_str), Some("not cached"));
    assert_eq!(
        changes.get("t2").map(String::as_str),
        Some("dependency 't1' changed")
    );
    assert_eq!(
        changes.get("t3").map(String::as_str),
        Some("dependency 't1' changed")
    );

    let order = detector.build_order(&updated, &changes).unwrap();
    assert_eq!(order[0], "t1");
    assert_eq!(order.len(), 3);

    // Re-running regenerates exactly the changed set.
    let results = scheduler_at(Arc::clone(&backend), cache_dir.path(), 2)
        .run_all(updated)
        .await
        .unwrap();
    assert!(results.values().all(|r| r.success));
    assert_eq!(backend.calls(), 6);
}
