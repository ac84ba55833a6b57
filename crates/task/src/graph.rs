//! Dependency graph validation and ordering
//!
//! The graph is a plain id -> dependency-ids mapping derived from the task
//! list. Validation and cycle detection run before any execution; ordering
//! uses Kahn's algorithm with a deterministic priority-then-id tie-break so
//! constrained runs always pick the same subset first.

use genforge_core::{Error, Result, Task};
use std::collections::{HashMap, HashSet};

/// Task id -> declared dependency ids
pub type DependencyGraph = HashMap<String, Vec<String>>;

/// Build the dependency graph for a task list
pub fn graph_of(tasks: &[Task]) -> DependencyGraph {
    tasks
        .iter()
        .map(|task| (task.id.clone(), task.dependencies.clone()))
        .collect()
}

/// Check that task ids are unique and every referenced dependency exists
pub fn validate(tasks: &[Task]) -> Result<()> {
    let mut ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !ids.insert(task.id.as_str()) {
            return Err(Error::configuration(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
    }

    for task in tasks {
        for dependency in &task.dependencies {
            if !ids.contains(dependency.as_str()) {
                return Err(Error::missing_dependency(&task.id, dependency));
            }
        }
    }

    Ok(())
}

/// Reject graphs containing a dependency cycle
pub fn detect_cycle(graph: &DependencyGraph) -> Result<()> {
    let mut visited = HashSet::with_capacity(graph.len());
    let mut stack = HashSet::new();

    // Sorted roots keep the reported task deterministic.
    let mut roots: Vec<&String> = graph.keys().collect();
    roots.sort();

    for root in roots {
        visit(root, graph, &mut visited, &mut stack)?;
    }
    Ok(())
}

fn visit(
    task_id: &str,
    graph: &DependencyGraph,
    visited: &mut HashSet<String>,
    stack: &mut HashSet<String>,
) -> Result<()> {
    if stack.contains(task_id) {
        return Err(Error::circular_dependency(task_id));
    }
    if visited.contains(task_id) {
        return Ok(());
    }

    stack.insert(task_id.to_string());
    if let Some(dependencies) = graph.get(task_id) {
        for dependency in dependencies {
            visit(dependency, graph, visited, stack)?;
        }
    }
    stack.remove(task_id);
    visited.insert(task_id.to_string());

    Ok(())
}

/// Full topological order over all tasks
///
/// Among simultaneously eligible tasks, ascending priority wins, with the
/// task id as a stable tie-break.
pub fn flat_order(tasks: &[Task]) -> Result<Vec<String>> {
    let all: HashSet<String> = tasks.iter().map(|task| task.id.clone()).collect();
    order_subset(tasks, &all)
}

/// Topological order restricted to `subset`
///
/// Edges are honored only when both endpoints are inside the subset. A
/// cycle within the subset is a structured error, never a truncated order.
pub fn order_subset(tasks: &[Task], subset: &HashSet<String>) -> Result<Vec<String>> {
    let members: Vec<&Task> = tasks.iter().filter(|task| subset.contains(&task.id)).collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(members.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::with_capacity(members.len());
    let priority: HashMap<&str, i32> = members
        .iter()
        .map(|task| (task.id.as_str(), task.priority))
        .collect();

    for task in &members {
        in_degree.entry(task.id.as_str()).or_insert(0);
        for dependency in &task.dependencies {
            if !subset.contains(dependency) {
                continue;
            }
            *in_degree.entry(task.id.as_str()).or_insert(0) += 1;
            dependents
                .entry(dependency.as_str())
                .or_default()
                .push(task.id.as_str());
        }
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(members.len());
    while !ready.is_empty() {
        ready.sort_by(|a, b| {
            priority[a]
                .cmp(&priority[b])
                .then_with(|| a.cmp(b))
        });
        let next = ready.remove(0);
        order.push(next.to_string());

        if let Some(children) = dependents.get(next) {
            for child in children {
                let degree = in_degree
                    .get_mut(child)
                    .expect("dependent registered during graph construction");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(child);
                }
            }
        }
    }

    if order.len() != members.len() {
        let mut remaining: Vec<&str> = members
            .iter()
            .map(|task| task.id.as_str())
            .filter(|id| !order.iter().any(|done| done == id))
            .collect();
        remaining.sort();
        return Err(Error::circular_dependency(
            remaining.first().copied().unwrap_or_default(),
        ));
    }

    Ok(order)
}

/// Dependency id -> ids of tasks that declare it
pub fn reverse_adjacency(graph: &DependencyGraph) -> HashMap<String, Vec<String>> {
    let mut reverse: HashMap<String, Vec<String>> = HashMap::with_capacity(graph.len());
    for (task_id, dependencies) in graph {
        for dependency in dependencies {
            reverse
                .entry(dependency.clone())
                .or_default()
                .push(task_id.clone());
        }
    }
    // Deterministic propagation order for callers walking the closure.
    for dependents in reverse.values_mut() {
        dependents.sort();
    }
    reverse
}
