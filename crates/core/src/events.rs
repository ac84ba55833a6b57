//! Progress events emitted by the scheduler
//!
//! The scheduler publishes per-task notifications to an optional
//! [`ProgressSink`]. Sinks are injected at construction time; the scheduler
//! functions correctly with the default no-op sink attached.

use serde::{Deserialize, Serialize};

/// Task execution events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskEvent {
    /// A task has started execution
    Started { task_id: String, title: String },
    /// Informational progress message for a running task
    Progress { task_id: String, message: String },
    /// A task has completed successfully
    Completed {
        task_id: String,
        duration_ms: u64,
        file_count: usize,
        from_cache: bool,
    },
    /// A task has failed
    Failed {
        task_id: String,
        duration_ms: u64,
        error: String,
    },
}

impl TaskEvent {
    /// Task id the event refers to
    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::Started { task_id, .. }
            | TaskEvent::Progress { task_id, .. }
            | TaskEvent::Completed { task_id, .. }
            | TaskEvent::Failed { task_id, .. } => task_id,
        }
    }
}

/// Receiver for scheduler progress notifications
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: TaskEvent);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: TaskEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        events: Mutex<Vec<TaskEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn notify(&self, event: TaskEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_task_id_accessor() {
        let event = TaskEvent::Completed {
            task_id: "t1".to_string(),
            duration_ms: 5,
            file_count: 2,
            from_cache: true,
        };
        assert_eq!(event.task_id(), "t1");
    }

    #[test]
    fn test_sink_receives_events() {
        let sink = RecordingSink {
            events: Mutex::new(Vec::new()),
        };
        sink.notify(TaskEvent::Started {
            task_id: "t1".to_string(),
            title: "Build parser".to_string(),
        });
        assert_eq!(sink.events.lock().unwrap().len(), 1);
    }
}
