// src/errors.rs

//! Crate-wide error types.
//!
//! [`WorkdagError`] covers structural problems (bad config, bad graph,
//! illegal lifecycle transitions). These are programming errors and are
//! surfaced immediately.
//!
//! [`TaskError`] covers failures of a single execution attempt. The executor
//! recovers from these through the retry policy instead of propagating them.

use std::time::Duration;

use thiserror::Error;

use crate::task::{Event, TaskState};

#[derive(Error, Debug)]
pub enum WorkdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    MissingDependency { task: String, dependency: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid transition for task '{task}': cannot apply '{event}' in state '{state}'")]
    InvalidTransition {
        task: String,
        state: TaskState,
        event: Event,
    },

    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single execution attempt of a task body.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    #[error("task body panicked: {0}")]
    Panicked(String),

    #[error("You must implement run for task '{0}'")]
    NotImplemented(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl TaskError {
    /// Short name of the error kind, used in failure logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Timeout(_) => "TimeoutError",
            TaskError::Panicked(_) => "PanicError",
            TaskError::NotImplemented(_) => "NotImplementedError",
            TaskError::Failed(_) => "TaskFailed",
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WorkdagError>;
