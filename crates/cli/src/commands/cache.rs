use crate::commands::resolve_cache_dir;
use anyhow::Context;
use clap::Subcommand;
use genforge_cache::{GenerationCacheStore, StoreConfig};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache statistics
    Stats,
    /// Remove all cache entries
    Clear,
    /// Remove entries whose TTL has elapsed
    Cleanup,
}

impl CacheCommands {
    pub async fn execute(self, cache_dir: Option<PathBuf>) -> anyhow::Result<()> {
        let cache_dir = resolve_cache_dir(cache_dir);
        let store = GenerationCacheStore::open(StoreConfig::new(&cache_dir))
            .with_context(|| format!("failed to open cache at '{}'", cache_dir.display()))?;

        match self {
            CacheCommands::Stats => {
                let stats = store.stats();
                println!("cache: {}", cache_dir.display());
                println!("  entries:       {}", stats.entries);
                println!("  hits:          {}", stats.hits);
                println!("  misses:        {}", stats.misses);
                println!("  evictions:     {}", stats.evictions);
                println!("  invalidations: {}", stats.invalidations);
                println!("  hit rate:      {:.1}%", stats.hit_rate * 100.0);
                println!(
                    "  disk usage:    {:.2} KB",
                    stats.disk_usage as f64 / 1024.0
                );
            }
            CacheCommands::Clear => {
                let removed = store.clear();
                println!("✓ removed {removed} cache entr{}", plural_y(removed));
            }
            CacheCommands::Cleanup => {
                let removed = store.cleanup_expired();
                println!("✓ removed {removed} expired entr{}", plural_y(removed));
            }
        }
        Ok(())
    }
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
