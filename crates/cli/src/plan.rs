//! Task plan documents
//!
//! A plan is the JSON handoff from the upstream planning step: a shared
//! project context plus an ordered map of task id -> task description. The
//! scheduler treats the parsed plan as read-only input.

use anyhow::Context;
use genforge_core::Task;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One task as written in the plan document (id comes from the map key)
#[derive(Debug, Clone, Deserialize)]
pub struct PlanTask {
    pub title: String,
    pub specification: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Parsed plan document
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPlan {
    #[serde(default)]
    pub project_context: String,
    pub tasks: IndexMap<String, PlanTask>,
}

impl TaskPlan {
    /// Load and parse a plan file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file '{}'", path.display()))?;
        let plan: TaskPlan = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse plan file '{}'", path.display()))?;
        Ok(plan)
    }

    /// Tasks in plan order
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|(id, task)| Task {
                id: id.clone(),
                title: task.title.clone(),
                specification: task.specification.clone(),
                dependencies: task.dependencies.clone(),
                priority: task.priority,
                tech_stack: task.tech_stack.clone(),
                patterns: task.patterns.clone(),
            })
            .collect()
    }
}
