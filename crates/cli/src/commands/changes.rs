use crate::commands::resolve_cache_dir;
use crate::plan::TaskPlan;
use anyhow::Context;
use clap::Args;
use genforge_cache::{GenerationCacheStore, StoreConfig};
use genforge_task::IncrementalBuildDetector;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ChangesArgs {
    /// Path to the task plan document
    pub plan: PathBuf,
}

impl ChangesArgs {
    pub async fn execute(self, cache_dir: Option<PathBuf>) -> anyhow::Result<()> {
        let plan = TaskPlan::load(&self.plan)?;
        let tasks = plan.tasks();

        let cache_dir = resolve_cache_dir(cache_dir);
        let store = Arc::new(
            GenerationCacheStore::open(StoreConfig::new(&cache_dir))
                .with_context(|| format!("failed to open cache at '{}'", cache_dir.display()))?,
        );

        let detector = IncrementalBuildDetector::new(store, plan.project_context.clone());
        let changes = detector
            .detect_changes(&tasks)
            .context("change detection failed")?;

        if changes.is_empty() {
            println!("all {} task(s) are up to date", tasks.len());
            return Ok(());
        }

        println!("{} of {} task(s) need a rebuild:", changes.len(), tasks.len());
        for (task_id, reason) in &changes {
            println!("  {task_id:<20} {reason}");
        }

        let order = detector
            .build_order(&tasks, &changes)
            .context("rebuild ordering failed")?;
        println!("\nrebuild order: {}", order.join(" -> "));
        Ok(())
    }
}
