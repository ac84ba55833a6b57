pub mod cache;
pub mod changes;
pub mod run;

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Execute every task in a plan
    Run(run::RunArgs),
    /// Show which tasks would rebuild, and in what order
    Changes(changes::ChangesArgs),
    /// Inspect or maintain the generation cache
    Cache {
        #[command(subcommand)]
        command: cache::CacheCommands,
    },
}

impl Commands {
    pub async fn execute(self, cache_dir: Option<PathBuf>) -> anyhow::Result<()> {
        match self {
            Commands::Run(args) => args.execute(cache_dir).await,
            Commands::Changes(args) => args.execute(cache_dir).await,
            Commands::Cache { command } => command.execute(cache_dir).await,
        }
    }
}

/// Cache directory: explicit flag, else the user cache root
pub fn resolve_cache_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("genforge")
    })
}
