//! Console progress reporting

use genforge_core::{ProgressSink, TaskEvent};

/// Prints one line per task lifecycle event
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn notify(&self, event: TaskEvent) {
        match event {
            TaskEvent::Started { task_id, title } => {
                println!("▶ {task_id}  {title}");
            }
            TaskEvent::Progress { task_id, message } => {
                println!("  {task_id}  {message}");
            }
            TaskEvent::Completed {
                task_id,
                duration_ms,
                file_count,
                from_cache,
            } => {
                let source = if from_cache { " (cached)" } else { "" };
                println!("✓ {task_id}  {file_count} file(s) in {duration_ms}ms{source}");
            }
            TaskEvent::Failed {
                task_id,
                duration_ms,
                error,
            } => {
                println!("✗ {task_id}  failed after {duration_ms}ms: {error}");
            }
        }
    }
}
