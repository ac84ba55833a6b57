//! Incremental build detection
//!
//! Pre-pass over a task list that asks the cache store which tasks actually
//! need to run. Direct changes come from the store's own lookup outcomes;
//! indirect ones are found by walking the reverse dependency graph from
//! every directly changed task, so a dependent rebuilds even when its own
//! entry would still be a hit.

use crate::graph::{self, reverse_adjacency};
use genforge_cache::{dependency_hash, key_for_context, CacheLookup, GenerationCacheStore};
use genforge_core::{GenerationContext, Result, Task};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Computes the minimal rebuild set for a task list
pub struct IncrementalBuildDetector {
    store: Arc<GenerationCacheStore>,
    project_context: String,
    file_snapshot: HashMap<String, String>,
}

impl IncrementalBuildDetector {
    pub fn new(store: Arc<GenerationCacheStore>, project_context: impl Into<String>) -> Self {
        Self {
            store,
            project_context: project_context.into(),
            file_snapshot: HashMap::new(),
        }
    }

    /// File snapshot fed into every task's cache key
    #[must_use]
    pub fn with_file_snapshot(mut self, file_snapshot: HashMap<String, String>) -> Self {
        self.file_snapshot = file_snapshot;
        self
    }

    /// Map of task id -> reason for every task that needs a rebuild
    ///
    /// Tasks absent from the map are unchanged. Reasons for propagated
    /// entries name the upstream task that forced the rebuild.
    pub fn detect_changes(&self, tasks: &[Task]) -> Result<IndexMap<String, String>> {
        graph::validate(tasks)?;

        let by_id: HashMap<&str, &Task> =
            tasks.iter().map(|task| (task.id.as_str(), task)).collect();

        let mut reasons: IndexMap<String, String> = IndexMap::new();
        for task in tasks {
            let ctx =
                GenerationContext::for_task(task, &self.project_context, self.file_snapshot.clone());
            let key = key_for_context(&ctx);
            let expected = self.expected_dependency_hash(task, &by_id);

            match self.store.get(&key, expected.as_deref()) {
                CacheLookup::Hit { .. } => {}
                CacheLookup::Miss { .. } => {
                    reasons.insert(task.id.clone(), "not cached".to_string());
                }
                CacheLookup::Stale { .. } => {
                    reasons.insert(task.id.clone(), "cache expired".to_string());
                }
                CacheLookup::Invalid { reason, .. } => {
                    reasons.insert(task.id.clone(), reason);
                }
            }
        }

        // Everything downstream of a changed task rebuilds too.
        let reverse = reverse_adjacency(&graph::graph_of(tasks));
        let mut queue: VecDeque<String> = reasons.keys().cloned().collect();
        while let Some(changed) = queue.pop_front() {
            let Some(dependents) = reverse.get(&changed) else {
                continue;
            };
            for dependent in dependents {
                if !reasons.contains_key(dependent) {
                    reasons.insert(
                        dependent.clone(),
                        format!("dependency '{changed}' changed"),
                    );
                    queue.push_back(dependent.clone());
                }
            }
        }

        debug!(
            changed = reasons.len(),
            total = tasks.len(),
            "incremental change detection complete"
        );
        Ok(reasons)
    }

    /// Topologically valid order over the changed subset
    pub fn build_order(
        &self,
        tasks: &[Task],
        changed: &IndexMap<String, String>,
    ) -> Result<Vec<String>> {
        let subset: HashSet<String> = changed.keys().cloned().collect();
        graph::order_subset(tasks, &subset)
    }

    /// Recompute the dependency hash a fresh entry for `task` would carry,
    /// from the currently cached outputs of its dependencies
    fn expected_dependency_hash(
        &self,
        task: &Task,
        by_id: &HashMap<&str, &Task>,
    ) -> Option<String> {
        if task.dependencies.is_empty() {
            return None;
        }

        let mut outputs: HashMap<String, HashMap<String, String>> = HashMap::new();
        for dep_id in &task.dependencies {
            let dependency = by_id
                .get(dep_id.as_str())
                .expect("dependency existence checked by validate");
            let dep_ctx = GenerationContext::for_task(
                dependency,
                &self.project_context,
                self.file_snapshot.clone(),
            );
            let dep_key = key_for_context(&dep_ctx);
            if let Some(entry) = self.store.peek(&dep_key) {
                if let Ok(files) = self.store.load_files(&entry) {
                    outputs.insert(dep_id.clone(), files);
                }
            }
        }

        Some(dependency_hash(&task.dependencies, &outputs))
    }
}
