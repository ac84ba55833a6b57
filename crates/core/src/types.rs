//! Task and generation types shared across the workspace
//!
//! A [`Task`] is the immutable description of one unit of generation work,
//! produced once per run by an upstream planning step. [`TaskExecution`] is
//! the scheduler-owned mutable wrapper that tracks a task through its state
//! machine for the lifetime of a single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable description of one unit of generation work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id within a run
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Free-text specification of what to generate
    pub specification: String,
    /// Ids of tasks whose output this task consumes; must all exist in the run
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Lower sorts first when several tasks are ready at once
    #[serde(default)]
    pub priority: i32,
    /// Technology stack hints forwarded to the backend
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Pattern identifiers consumed as generation hints
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Task {
    /// Create a task with no dependencies and default priority
    pub fn new(id: impl Into<String>, title: impl Into<String>, specification: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            specification: specification.into(),
            dependencies: Vec::new(),
            priority: 0,
            tech_stack: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Builder-style dependency list
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Builder-style priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Task execution state machine
///
/// `Queued` is initial; `Complete` and `Failed` are terminal. A task may only
/// move to `InProgress` once every task named in its dependency list is
/// terminal (successful or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Queued,
    InProgress,
    Complete,
    Failed,
}

impl TaskStatus {
    /// Whether this status is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }
}

/// Runtime wrapper around a task, owned by the scheduler for one run
#[derive(Debug, Clone)]
pub struct TaskExecution {
    /// The immutable task description
    pub task: Task,
    /// Current state
    pub status: TaskStatus,
    /// Terminal result, present once the task finishes
    pub result: Option<GenerationResult>,
    /// When execution started
    pub started_at: Option<DateTime<Utc>>,
    /// When execution reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskExecution {
    /// Create a queued execution for a task
    pub fn new(task: Task) -> Self {
        Self {
            task,
            status: TaskStatus::Queued,
            result: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `InProgress` and stamp the start time
    pub fn start(&mut self) {
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    /// Record a successful terminal result
    pub fn complete(&mut self, result: GenerationResult) {
        self.status = TaskStatus::Complete;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    /// Record a failed terminal result
    pub fn fail(&mut self, result: GenerationResult) {
        self.status = TaskStatus::Failed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration between start and completion, if both happened
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Input handed to the generation backend for one task
///
/// Callees must treat the context as read-only; it is built once per task
/// from the task's own fields plus run-wide inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationContext {
    pub task_id: String,
    pub specification: String,
    /// Run-wide project description shared by every task
    pub project_context: String,
    pub tech_stack: Vec<String>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
    /// Snapshot of relevant existing files at run start (relative path -> content)
    #[serde(default)]
    pub file_snapshot: HashMap<String, String>,
}

impl GenerationContext {
    /// Build the context for one task from run-wide inputs
    pub fn for_task(
        task: &Task,
        project_context: impl Into<String>,
        file_snapshot: HashMap<String, String>,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            specification: task.specification.clone(),
            project_context: project_context.into(),
            tech_stack: task.tech_stack.clone(),
            dependencies: task.dependencies.clone(),
            patterns: task.patterns.clone(),
            file_snapshot,
        }
    }
}

/// Outcome of one generation, whether produced by the backend or the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    /// Generated files (relative path -> content)
    pub files: HashMap<String, String>,
    pub error: Option<String>,
    /// Backend wall time; zero for cache-sourced results
    pub duration_ms: u64,
    /// Whether this result was served from the cache
    #[serde(default)]
    pub from_cache: bool,
    /// Cumulative hit count of the serving cache entry, when cache-sourced
    #[serde(default)]
    pub cache_hits: Option<u64>,
}

impl GenerationResult {
    /// Successful backend result
    pub fn success(files: HashMap<String, String>, duration_ms: u64) -> Self {
        Self {
            success: true,
            files,
            error: None,
            duration_ms,
            from_cache: false,
            cache_hits: None,
        }
    }

    /// Failed backend result
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            files: HashMap::new(),
            error: Some(error.into()),
            duration_ms,
            from_cache: false,
            cache_hits: None,
        }
    }

    /// Number of generated files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
