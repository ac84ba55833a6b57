//! Deterministic cache key generation
//!
//! A cache key digests every semantic input of a task: its specification,
//! the run-wide project context, the tech stack, the declared dependency
//! list, pattern hints, and the file snapshot. List-typed fields are sorted
//! before hashing so that set-equal inputs collapse to the same key
//! regardless of the order the planner emitted them in. The final hash is
//! prefixed with a bounded slice of the task id for human debuggability.

use genforge_core::GenerationContext;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Number of task-id characters carried into the key for readability
const KEY_PREFIX_LEN: usize = 8;

/// Delimiter between component hashes before the final digest
const COMPONENT_DELIMITER: &str = ":";

/// Metadata key under which an entry stores its dependency-id list
pub const DEPENDENCIES_METADATA_KEY: &str = "dependencies";

/// Compute the SHA-256 hash of a byte slice, hex-encoded
fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a string slice
pub fn content_hash(content: &str) -> String {
    compute_hash(content.as_bytes())
}

/// Hash a list of strings independent of their order
fn hash_sorted_list(items: &[String]) -> String {
    let mut sorted: Vec<&str> = items.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for item in sorted {
        hasher.update(item.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Hash a path -> content mapping independent of insertion order
pub fn hash_file_map(files: &HashMap<String, String>) -> String {
    let mut paths: Vec<&str> = files.keys().map(String::as_str).collect();
    paths.sort_unstable();

    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update(files[path].as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Build the cache key for a set of task inputs
///
/// Pure and deterministic: identical inputs (up to ordering of the
/// list-typed fields) always produce identical keys.
pub fn build_key(
    task_id: &str,
    specification: &str,
    project_context: &str,
    tech_stack: &[String],
    dependencies: &[String],
    patterns: &[String],
    file_snapshot: &HashMap<String, String>,
) -> String {
    let components = [
        content_hash(specification),
        content_hash(project_context),
        hash_sorted_list(tech_stack),
        hash_sorted_list(dependencies),
        hash_sorted_list(patterns),
        hash_file_map(file_snapshot),
    ];

    let combined = compute_hash(components.join(COMPONENT_DELIMITER).as_bytes());

    // Keys double as directory names, so the readable prefix keeps only
    // filesystem-safe characters.
    let prefix: String = task_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(KEY_PREFIX_LEN)
        .collect();

    if prefix.is_empty() {
        combined
    } else {
        format!("{prefix}-{combined}")
    }
}

/// Build the cache key for a generation context
pub fn key_for_context(ctx: &GenerationContext) -> String {
    build_key(
        &ctx.task_id,
        &ctx.specification,
        &ctx.project_context,
        &ctx.tech_stack,
        &ctx.dependencies,
        &ctx.patterns,
        &ctx.file_snapshot,
    )
}

/// Digest the combined outputs of a task's declared dependencies
///
/// Dependencies are visited in sorted id order; ids absent from the output
/// map are skipped, so the result is deterministic for fixed inputs even
/// when some upstream tasks produced nothing.
pub fn dependency_hash(
    dependency_ids: &[String],
    outputs_by_id: &HashMap<String, HashMap<String, String>>,
) -> String {
    let mut present: Vec<&str> = dependency_ids
        .iter()
        .map(String::as_str)
        .filter(|id| outputs_by_id.contains_key(*id))
        .collect();
    present.sort_unstable();
    present.dedup();

    let mut hasher = Sha256::new();
    for id in present {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
        hasher.update(hash_file_map(&outputs_by_id[id]).as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
