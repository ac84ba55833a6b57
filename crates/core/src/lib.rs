//! Core types for the genforge workspace
//!
//! This crate defines the shared vocabulary of the system: the immutable
//! [`Task`] description, its runtime [`TaskExecution`] wrapper, the
//! generation backend input/output types, the progress event model, and the
//! workspace-wide [`Error`] type.

pub mod errors;
pub mod events;
pub mod types;

pub use errors::{Error, Result};
pub use events::{NullSink, ProgressSink, TaskEvent};
pub use types::{GenerationContext, GenerationResult, Task, TaskExecution, TaskStatus};
