//! Task graph scheduling for genforge
//!
//! Validates the dependency graph of a run, computes what actually needs to
//! rebuild, and executes tasks under a bounded worker pool through the
//! caching executor in `genforge-cache`.

pub mod graph;
pub mod incremental;
pub mod scheduler;

pub use incremental::IncrementalBuildDetector;
pub use scheduler::{
    FailurePolicy, SchedulerConfig, TaskScheduler, DEFAULT_POLL_INTERVAL,
};
