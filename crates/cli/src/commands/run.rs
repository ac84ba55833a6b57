use crate::commands::resolve_cache_dir;
use crate::generator::ScriptedGenerator;
use crate::plan::TaskPlan;
use crate::progress::ConsoleSink;
use anyhow::Context;
use clap::Args;
use genforge_cache::{CachedGenerator, GenerationCacheStore, StoreConfig};
use genforge_task::{FailurePolicy, SchedulerConfig, TaskScheduler};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the task plan document
    pub plan: PathBuf,

    /// Maximum number of concurrently running tasks
    #[arg(long, default_value_t = 4)]
    pub max_parallel: usize,

    /// Run tasks one at a time in topological order
    #[arg(long)]
    pub sequential: bool,

    /// Regenerate every task even when cached
    #[arg(long)]
    pub force: bool,

    /// Fail tasks whose dependencies failed instead of running them anyway
    #[arg(long)]
    pub strict_failures: bool,

    /// Scheduler readiness poll interval in milliseconds
    #[arg(long, default_value_t = 50)]
    pub poll_interval_ms: u64,
}

impl RunArgs {
    pub async fn execute(self, cache_dir: Option<PathBuf>) -> anyhow::Result<()> {
        let plan = TaskPlan::load(&self.plan)?;
        let tasks = plan.tasks();

        let cache_dir = resolve_cache_dir(cache_dir);
        let store = Arc::new(
            GenerationCacheStore::open(StoreConfig::new(&cache_dir))
                .with_context(|| format!("failed to open cache at '{}'", cache_dir.display()))?,
        );
        let executor = Arc::new(CachedGenerator::new(Arc::new(ScriptedGenerator), store));

        let config = SchedulerConfig {
            max_parallel: if self.sequential { 1 } else { self.max_parallel },
            force: self.force,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            failure_policy: if self.strict_failures {
                FailurePolicy::Skip
            } else {
                FailurePolicy::BestEffort
            },
            project_context: plan.project_context.clone(),
            file_snapshot: Default::default(),
        };

        let scheduler = TaskScheduler::new(executor, config).with_sink(Arc::new(ConsoleSink));
        let results = scheduler
            .run_all(tasks)
            .await
            .context("generation run failed")?;

        let mut rows: Vec<_> = results.iter().collect();
        rows.sort_by(|(a, _), (b, _)| a.cmp(b));

        println!();
        for (task_id, result) in &rows {
            let status = if result.success { "ok" } else { "FAILED" };
            let source = if result.from_cache { "cache" } else { "backend" };
            println!(
                "{task_id:<20} {status:<7} {files:>3} file(s)  {duration:>6}ms  {source}",
                files = result.file_count(),
                duration = result.duration_ms,
            );
        }

        let failed = results.values().filter(|r| !r.success).count();
        if failed > 0 {
            anyhow::bail!("{failed} task(s) failed");
        }
        Ok(())
    }
}
