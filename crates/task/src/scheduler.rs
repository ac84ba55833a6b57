//! Bounded parallel task scheduler
//!
//! Owns the dependency graph for one run. After pre-flight validation the
//! scheduler repeatedly computes the set of ready tasks (every dependency
//! terminal), launches them through the caching executor up to the pool
//! bound, and records completions until every task is terminal. Readiness
//! is re-evaluated on a short, tunable poll interval; a tick where nothing
//! is ready and nothing is in flight while work remains is reported as a
//! scheduling deadlock rather than hanging.

use crate::graph;
use genforge_cache::CachedGenerator;
use genforge_core::{
    Error, GenerationContext, GenerationResult, NullSink, ProgressSink, Result, Task, TaskEvent,
    TaskExecution, TaskStatus,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Delay between readiness re-evaluations when nothing has finished
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What happens to tasks downstream of a failed dependency
///
/// The default preserves the original best-effort behavior: a failed
/// dependency still completes the graph, and dependents run with whatever
/// upstream output exists. `Skip` fails dependents without invoking the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    BestEffort,
    Skip,
}

/// Run-wide scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently in-flight tasks; fixed for the run
    pub max_parallel: usize,
    /// Bypass cache reads for every task
    pub force: bool,
    pub poll_interval: Duration,
    pub failure_policy: FailurePolicy,
    /// Project description shared by every task's generation context
    pub project_context: String,
    /// Snapshot of relevant existing files shared by every task
    pub file_snapshot: HashMap<String, String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            force: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_policy: FailurePolicy::default(),
            project_context: String::new(),
            file_snapshot: HashMap::new(),
        }
    }
}

/// Schedules one run's tasks over the caching executor
pub struct TaskScheduler {
    executor: Arc<CachedGenerator>,
    config: SchedulerConfig,
    sink: Arc<dyn ProgressSink>,
}

impl TaskScheduler {
    pub fn new(executor: Arc<CachedGenerator>, config: SchedulerConfig) -> Self {
        Self {
            executor,
            config,
            sink: Arc::new(NullSink),
        }
    }

    /// Attach a progress sink; the scheduler works fine without one
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Execute every task and return one result per task id
    ///
    /// Validation and cycle errors abort before anything executes, so a
    /// returned error means the run never started. Per-task backend
    /// failures are recorded in the map and never abort sibling tasks.
    pub async fn run_all(&self, tasks: Vec<Task>) -> Result<HashMap<String, GenerationResult>> {
        graph::validate(&tasks)?;
        graph::detect_cycle(&graph::graph_of(&tasks))?;

        let mut max_parallel = self.config.max_parallel.max(1);
        if !self.executor.supports_parallel() {
            max_parallel = 1;
        }

        info!(total = tasks.len(), max_parallel, "starting generation run");
        let run_start = Instant::now();

        let results = if max_parallel == 1 {
            self.run_sequential(tasks).await?
        } else {
            self.run_parallel(tasks, max_parallel).await?
        };

        let succeeded = results.values().filter(|r| r.success).count();
        let cache_sourced = results.values().filter(|r| r.from_cache).count();
        info!(
            total = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            cache_sourced,
            elapsed_ms = run_start.elapsed().as_millis() as u64,
            "generation run complete"
        );
        Ok(results)
    }

    async fn run_parallel(
        &self,
        tasks: Vec<Task>,
        max_parallel: usize,
    ) -> Result<HashMap<String, GenerationResult>> {
        let total = tasks.len();
        let mut executions: HashMap<String, TaskExecution> = tasks
            .into_iter()
            .map(|task| (task.id.clone(), TaskExecution::new(task)))
            .collect();

        let mut completed: HashSet<String> = HashSet::with_capacity(total);
        let mut failed: HashSet<String> = HashSet::new();
        let mut in_progress: HashSet<String> = HashSet::new();
        let mut results: HashMap<String, GenerationResult> = HashMap::with_capacity(total);
        let mut outputs: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut join_set: JoinSet<(String, Result<GenerationResult>)> = JoinSet::new();

        while completed.len() < total {
            if self.config.failure_policy == FailurePolicy::Skip {
                self.skip_blocked(&mut executions, &mut completed, &mut failed, &mut results);
            }
            if completed.len() >= total {
                break;
            }

            let slots = max_parallel.saturating_sub(in_progress.len());
            let ready = ready_tasks(&executions, &completed, slots);

            if ready.is_empty() && in_progress.is_empty() {
                let unfinished = executions
                    .values()
                    .filter(|execution| !execution.status.is_terminal())
                    .map(|execution| execution.task.id.clone())
                    .collect();
                return Err(Error::scheduling_deadlock(unfinished));
            }

            for task_id in ready {
                let execution = executions.get_mut(&task_id).expect("ready task exists");
                execution.start();
                self.sink.notify(TaskEvent::Started {
                    task_id: task_id.clone(),
                    title: execution.task.title.clone(),
                });
                debug!(task_id = %task_id, "task started");

                let ctx = GenerationContext::for_task(
                    &execution.task,
                    &self.config.project_context,
                    self.config.file_snapshot.clone(),
                );
                let dep_outputs = collect_outputs(&execution.task.dependencies, &outputs);
                let executor = Arc::clone(&self.executor);
                let force = self.config.force;
                in_progress.insert(task_id);
                join_set.spawn(async move {
                    let outcome = executor.execute(&ctx, Some(&dep_outputs), force).await;
                    (ctx.task_id, outcome)
                });
            }

            match tokio::time::timeout(self.config.poll_interval, join_set.join_next()).await {
                Ok(Some(Ok((task_id, outcome)))) => {
                    in_progress.remove(&task_id);
                    self.finish_task(
                        &task_id,
                        outcome,
                        &mut executions,
                        &mut completed,
                        &mut failed,
                        &mut results,
                        &mut outputs,
                    );
                }
                Ok(Some(Err(join_error))) => {
                    return Err(Error::configuration(format!(
                        "task execution aborted unexpectedly: {join_error}"
                    )));
                }
                // Nothing in flight: loop re-evaluates readiness immediately.
                Ok(None) => {}
                // Poll tick elapsed with nothing finished.
                Err(_) => {}
            }
        }

        Ok(results)
    }

    async fn run_sequential(&self, tasks: Vec<Task>) -> Result<HashMap<String, GenerationResult>> {
        let order = graph::flat_order(&tasks)?;
        let mut executions: HashMap<String, TaskExecution> = tasks
            .into_iter()
            .map(|task| (task.id.clone(), TaskExecution::new(task)))
            .collect();

        let mut completed: HashSet<String> = HashSet::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut results: HashMap<String, GenerationResult> = HashMap::new();
        let mut outputs: HashMap<String, HashMap<String, String>> = HashMap::new();

        for task_id in order {
            if self.config.failure_policy == FailurePolicy::Skip {
                self.skip_blocked(&mut executions, &mut completed, &mut failed, &mut results);
                if completed.contains(&task_id) {
                    continue;
                }
            }

            let execution = executions.get_mut(&task_id).expect("ordered task exists");
            execution.start();
            self.sink.notify(TaskEvent::Started {
                task_id: task_id.clone(),
                title: execution.task.title.clone(),
            });
            debug!(task_id = %task_id, "task started");

            let ctx = GenerationContext::for_task(
                &execution.task,
                &self.config.project_context,
                self.config.file_snapshot.clone(),
            );
            let dep_outputs = collect_outputs(&execution.task.dependencies, &outputs);
            let outcome = self
                .executor
                .execute(&ctx, Some(&dep_outputs), self.config.force)
                .await;

            self.finish_task(
                &task_id,
                outcome,
                &mut executions,
                &mut completed,
                &mut failed,
                &mut results,
                &mut outputs,
            );
        }

        Ok(results)
    }

    /// Record one task's terminal outcome and emit the matching event
    #[allow(clippy::too_many_arguments)]
    fn finish_task(
        &self,
        task_id: &str,
        outcome: Result<GenerationResult>,
        executions: &mut HashMap<String, TaskExecution>,
        completed: &mut HashSet<String>,
        failed: &mut HashSet<String>,
        results: &mut HashMap<String, GenerationResult>,
        outputs: &mut HashMap<String, HashMap<String, String>>,
    ) {
        let execution = executions.get_mut(task_id).expect("finished task exists");
        let result = match outcome {
            Ok(result) => result,
            // Executor-level failures are recovered per task, not per run.
            Err(e) => GenerationResult::failure(e.to_string(), 0),
        };

        if result.success {
            if result.from_cache {
                self.sink.notify(TaskEvent::Progress {
                    task_id: task_id.to_string(),
                    message: format!(
                        "served from cache ({} prior hit(s))",
                        result.cache_hits.unwrap_or(0).saturating_sub(1)
                    ),
                });
            }
            outputs.insert(task_id.to_string(), result.files.clone());
            execution.complete(result.clone());
            self.sink.notify(TaskEvent::Completed {
                task_id: task_id.to_string(),
                duration_ms: elapsed_ms(execution, &result),
                file_count: result.file_count(),
                from_cache: result.from_cache,
            });
            debug!(
                task_id,
                from_cache = result.from_cache,
                files = result.file_count(),
                "task complete"
            );
        } else {
            let error = result
                .error
                .clone()
                .unwrap_or_else(|| "generation failed".to_string());
            execution.fail(result.clone());
            failed.insert(task_id.to_string());
            self.sink.notify(TaskEvent::Failed {
                task_id: task_id.to_string(),
                duration_ms: elapsed_ms(execution, &result),
                error: error.clone(),
            });
            warn!(task_id, error = %error, "task failed");
        }

        completed.insert(task_id.to_string());
        results.insert(task_id.to_string(), result);
    }

    /// Under [`FailurePolicy::Skip`], fail every queued task that depends
    /// on a failed one, transitively, without invoking the backend
    fn skip_blocked(
        &self,
        executions: &mut HashMap<String, TaskExecution>,
        completed: &mut HashSet<String>,
        failed: &mut HashSet<String>,
        results: &mut HashMap<String, GenerationResult>,
    ) {
        loop {
            let victims: Vec<(String, String)> = executions
                .values()
                .filter(|execution| execution.status == TaskStatus::Queued)
                .filter_map(|execution| {
                    execution
                        .task
                        .dependencies
                        .iter()
                        .find(|dependency| failed.contains(*dependency))
                        .map(|dependency| (execution.task.id.clone(), dependency.clone()))
                })
                .collect();
            if victims.is_empty() {
                break;
            }

            for (task_id, dependency) in victims {
                let message = format!("skipped: dependency '{dependency}' failed");
                let result = GenerationResult::failure(&message, 0);
                let execution = executions.get_mut(&task_id).expect("victim exists");
                execution.fail(result.clone());
                failed.insert(task_id.clone());
                completed.insert(task_id.clone());
                self.sink.notify(TaskEvent::Failed {
                    task_id: task_id.clone(),
                    duration_ms: 0,
                    error: message.clone(),
                });
                warn!(task_id = %task_id, dependency = %dependency, "task skipped after upstream failure");
                results.insert(task_id, result);
            }
        }
    }
}

/// Event durations prefer wall time; cache-sourced results report zero
/// backend time, so the execution stamps are the honest elapsed figure.
fn elapsed_ms(execution: &TaskExecution, result: &GenerationResult) -> u64 {
    execution
        .duration()
        .map(|d| d.num_milliseconds().max(0) as u64)
        .unwrap_or(result.duration_ms)
}

/// Queued tasks whose dependencies are all terminal, best-first
fn ready_tasks(
    executions: &HashMap<String, TaskExecution>,
    completed: &HashSet<String>,
    slots: usize,
) -> Vec<String> {
    if slots == 0 {
        return Vec::new();
    }

    let mut ready: Vec<&TaskExecution> = executions
        .values()
        .filter(|execution| execution.status == TaskStatus::Queued)
        .filter(|execution| {
            execution
                .task
                .dependencies
                .iter()
                .all(|dependency| completed.contains(dependency))
        })
        .collect();

    ready.sort_by(|a, b| {
        a.task
            .priority
            .cmp(&b.task.priority)
            .then_with(|| a.task.id.cmp(&b.task.id))
    });

    ready
        .into_iter()
        .take(slots)
        .map(|execution| execution.task.id.clone())
        .collect()
}

/// Successful upstream outputs for a task's declared dependencies
fn collect_outputs(
    dependencies: &[String],
    outputs: &HashMap<String, HashMap<String, String>>,
) -> HashMap<String, HashMap<String, String>> {
    dependencies
        .iter()
        .filter_map(|dependency| {
            outputs
                .get(dependency)
                .map(|files| (dependency.clone(), files.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use genforge_cache::{Generator, GenerationCacheStore, StoreConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records start/end markers so tests can assert ordering
    struct RecordingGenerator {
        log: Mutex<Vec<String>>,
        calls: AtomicUsize,
        fail_ids: Vec<String>,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_ids: Vec::new(),
            }
        }

        fn failing_for(ids: &[&str]) -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_ids: ids.iter().map(|id| id.to_string()).collect(),
            }
        }

        fn log_entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, ctx: &GenerationContext) -> Result<GenerationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("start:{}", ctx.task_id));
            tokio::time::sleep(Duration::from_millis(15)).await;
            self.log.lock().unwrap().push(format!("end:{}", ctx.task_id));

            if self.fail_ids.contains(&ctx.task_id) {
                return Ok(GenerationResult::failure(
                    format!("backend rejected '{}'", ctx.task_id),
                    15,
                ));
            }
            let mut files = HashMap::new();
            files.insert(format!("{}.rs", ctx.task_id), format!("// {}", ctx.task_id));
            Ok(GenerationResult::success(files, 15))
        }
    }

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, id, format!("spec {id}"))
            .with_dependencies(deps.iter().map(|d| d.to_string()).collect())
    }

    fn scheduler(
        backend: Arc<RecordingGenerator>,
        dir: &TempDir,
        config: SchedulerConfig,
    ) -> TaskScheduler {
        let store =
            Arc::new(GenerationCacheStore::open(StoreConfig::new(dir.path())).unwrap());
        let executor = Arc::new(CachedGenerator::new(backend, store));
        TaskScheduler::new(executor, config)
    }

    #[tokio::test]
    async fn test_diamond_graph_orders_correctly() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::new());
        let config = SchedulerConfig {
            max_parallel: 2,
            ..SchedulerConfig::default()
        };
        let sched = scheduler(Arc::clone(&backend), &dir, config);

        let tasks = vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a"]),
            task("d", &["b", "c"]),
        ];
        let results = sched.run_all(tasks).await.unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.values().all(|r| r.success));

        let log = backend.log_entries();
        let position = |marker: &str| log.iter().position(|e| e == marker).unwrap();
        assert!(position("end:a") < position("start:b"));
        assert!(position("end:a") < position("start:c"));
        assert!(position("end:b") < position("start:d"));
        assert!(position("end:c") < position("start:d"));
    }

    #[tokio::test]
    async fn test_missing_dependency_fails_before_execution() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::new());
        let sched = scheduler(Arc::clone(&backend), &dir, SchedulerConfig::default());

        let err = sched
            .run_all(vec![task("a", &["ghost"])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_cycle_fails_before_execution() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::new());
        let sched = scheduler(Arc::clone(&backend), &dir, SchedulerConfig::default());

        let err = sched
            .run_all(vec![task("a", &["b"]), task("b", &["a"])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_best_effort_runs_dependents_of_failed_tasks() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::failing_for(&["a"]));
        let sched = scheduler(Arc::clone(&backend), &dir, SchedulerConfig::default());

        let results = sched
            .run_all(vec![task("a", &[]), task("b", &["a"])])
            .await
            .unwrap();

        assert!(!results["a"].success);
        assert!(results["b"].success);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_skip_policy_fails_dependents_without_backend_call() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::failing_for(&["a"]));
        let config = SchedulerConfig {
            failure_policy: FailurePolicy::Skip,
            ..SchedulerConfig::default()
        };
        let sched = scheduler(Arc::clone(&backend), &dir, config);

        let results = sched
            .run_all(vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])])
            .await
            .unwrap();

        assert!(!results["a"].success);
        assert!(!results["b"].success);
        assert!(!results["c"].success);
        assert!(results["b"].error.as_deref().unwrap().contains("dependency 'a' failed"));
        assert!(results["c"].error.as_deref().unwrap().contains("dependency 'b' failed"));
        // Only the root task ever reached the backend.
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_sequential_mode_respects_priority() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::new());
        let config = SchedulerConfig {
            max_parallel: 1,
            ..SchedulerConfig::default()
        };
        let sched = scheduler(Arc::clone(&backend), &dir, config);

        let tasks = vec![
            task("late", &[]).with_priority(9),
            task("early", &[]).with_priority(1),
            task("middle", &[]).with_priority(5),
        ];
        sched.run_all(tasks).await.unwrap();

        let log = backend.log_entries();
        assert_eq!(
            log,
            vec![
                "start:early",
                "end:early",
                "start:middle",
                "end:middle",
                "start:late",
                "end:late"
            ]
        );
    }

    #[tokio::test]
    async fn test_parallel_selection_prefers_lower_priority_value() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::new());
        let config = SchedulerConfig {
            max_parallel: 2,
            ..SchedulerConfig::default()
        };
        let sched = scheduler(Arc::clone(&backend), &dir, config);

        let tasks = vec![
            task("w", &[]).with_priority(3),
            task("x", &[]).with_priority(1),
            task("y", &[]).with_priority(2),
            task("z", &[]).with_priority(4),
        ];
        sched.run_all(tasks).await.unwrap();

        let log = backend.log_entries();
        let position = |marker: &str| log.iter().position(|e| e == marker).unwrap();
        // The two lowest-priority-value tasks claim the first two slots.
        assert!(position("start:x") < position("start:w"));
        assert!(position("start:y") < position("start:z"));
    }

    #[tokio::test]
    async fn test_every_task_gets_a_result() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(RecordingGenerator::failing_for(&["b"]));
        let sched = scheduler(Arc::clone(&backend), &dir, SchedulerConfig::default());

        let results = sched
            .run_all(vec![task("a", &[]), task("b", &[]), task("c", &["a", "b"])])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results["a"].success);
        assert!(!results["b"].success);
        assert!(results["c"].success);
    }
}
