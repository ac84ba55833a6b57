use std::path::PathBuf;

/// Result type alias for genforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for genforge operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A task references a dependency id that does not exist in the run
    #[error("task '{task_id}' depends on unknown task '{dependency}'")]
    MissingDependency { task_id: String, dependency: String },

    /// The dependency graph contains a cycle
    #[error("circular dependency detected involving task '{task_id}'")]
    CircularDependency { task_id: String },

    /// No task is ready and none is running, yet the run is not complete
    #[error("scheduling deadlock: no task is ready and none is in flight; unfinished tasks: {}", .unfinished.join(", "))]
    SchedulingDeadlock { unfinished: Vec<String> },

    /// Generation backend failure for a specific task
    #[error("generation failed for task '{task_id}': {message}")]
    Generation { task_id: String, message: String },

    /// Cache store errors that are not plain I/O failures
    #[error("cache error for key '{key}': {message}")]
    Cache { key: String, message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Configuration {
            message: format!("An internal error occurred: {error}"),
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing dependency error
    #[must_use]
    pub fn missing_dependency(task_id: impl Into<String>, dependency: impl Into<String>) -> Self {
        Error::MissingDependency {
            task_id: task_id.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a circular dependency error
    #[must_use]
    pub fn circular_dependency(task_id: impl Into<String>) -> Self {
        Error::CircularDependency {
            task_id: task_id.into(),
        }
    }

    /// Create a scheduling deadlock error
    #[must_use]
    pub fn scheduling_deadlock(mut unfinished: Vec<String>) -> Self {
        unfinished.sort();
        Error::SchedulingDeadlock { unfinished }
    }

    /// Create a generation error
    #[must_use]
    pub fn generation(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Generation {
            task_id: task_id.into(),
            message: message.into(),
        }
    }

    /// Create a cache error
    #[must_use]
    pub fn cache(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Cache {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}
