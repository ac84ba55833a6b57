//! Deterministic local generation backend
//!
//! Stands in for a real generation service so runs are reproducible
//! offline: the same context always renders the same files, which is what
//! makes dry runs exercise the cache exactly like production traffic. A
//! real backend plugs in at the same [`Generator`] trait.

use async_trait::async_trait;
use genforge_cache::Generator;
use genforge_core::{GenerationContext, GenerationResult, Result};
use std::collections::HashMap;
use std::time::Instant;

/// Renders a scaffold module and notes file from the task context
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptedGenerator;

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, ctx: &GenerationContext) -> Result<GenerationResult> {
        let start = Instant::now();
        let module = module_name(&ctx.task_id);

        let mut files = HashMap::new();
        files.insert(format!("src/{module}.rs"), render_module(ctx, &module));
        files.insert(format!("docs/{module}.md"), render_notes(ctx));

        Ok(GenerationResult::success(
            files,
            start.elapsed().as_millis() as u64,
        ))
    }
}

fn module_name(task_id: &str) -> String {
    let cleaned: String = task_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("m{cleaned}")
    } else {
        cleaned
    }
}

fn render_module(ctx: &GenerationContext, module: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("//! {}\n", first_line(&ctx.specification)));
    if !ctx.project_context.is_empty() {
        out.push_str(&format!("//!\n//! Part of: {}\n", first_line(&ctx.project_context)));
    }
    out.push('\n');

    for dependency in &ctx.dependencies {
        out.push_str(&format!("use crate::{};\n", module_name(dependency)));
    }
    if !ctx.dependencies.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!(
        "pub struct {};\n\nimpl {} {{\n    pub fn describe() -> &'static str {{\n        {:?}\n    }}\n}}\n",
        type_name(module),
        type_name(module),
        first_line(&ctx.specification),
    ));
    out
}

fn render_notes(ctx: &GenerationContext) -> String {
    let mut out = format!("# {}\n\n{}\n", ctx.task_id, ctx.specification.trim());
    if !ctx.tech_stack.is_empty() {
        out.push_str(&format!("\nStack: {}\n", ctx.tech_stack.join(", ")));
    }
    if !ctx.patterns.is_empty() {
        out.push_str(&format!("Patterns: {}\n", ctx.patterns.join(", ")));
    }
    if !ctx.dependencies.is_empty() {
        out.push_str(&format!("Depends on: {}\n", ctx.dependencies.join(", ")));
    }
    out
}

fn type_name(module: &str) -> String {
    module
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}
