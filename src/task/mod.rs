// src/task/mod.rs

//! Tasks and their lifecycle.
//!
//! - [`Task`] is the authoring contract: identity, dependencies, outputs,
//!   a body, and optional retry/timeout overrides.
//! - [`builder`] builds closure-backed tasks without a dedicated type.
//! - [`state`] holds the lifecycle states, events, and transition table.
//! - [`node`] wraps a task with its thread-safe lifecycle inside a graph.
//! - [`handle`] binds a node to its resolved upstream nodes for scheduling.
//! - [`target`] provides output artifacts answering an `exists` probe.

pub mod builder;
pub mod handle;
pub mod node;
pub mod state;
pub mod target;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TaskError;
use crate::types::{Dependencies, TaskId};

pub use builder::{FnTask, TaskBuilder};
pub use handle::TaskHandle;
pub use node::{TaskFailure, TaskNode, format_elapsed};
pub use state::{Event, TaskState};
pub use target::{FlagTarget, LocalTarget, Target};

/// Boxed future returned by task bodies.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outputs of a task's dependencies, in the shape the dependencies were
/// declared.
pub type TaskInput = Dependencies<Vec<Arc<dyn Target>>>;

/// A unit of work.
///
/// Only [`Task::id`] is required. A task with no outputs always runs; a task
/// whose outputs all exist is skipped without running. The default
/// [`Task::run`] fails every attempt with [`TaskError::NotImplemented`].
pub trait Task: Send + Sync {
    fn id(&self) -> &str;

    /// Ids of the tasks this one waits on.
    fn requires(&self) -> Dependencies<TaskId> {
        Dependencies::None
    }

    /// Artifacts produced by this task. Evaluated once, when the task is
    /// added to a graph.
    fn output(&self) -> Vec<Arc<dyn Target>> {
        Vec::new()
    }

    /// Task body.
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, anyhow::Result<()>> {
        let id = ctx.id().to_string();
        Box::pin(async move { Err(TaskError::NotImplemented(id).into()) })
    }

    /// `None` uses the configured default.
    fn max_retry(&self) -> Option<u32> {
        None
    }

    /// `None` uses the configured default.
    fn retry_interval(&self) -> Option<Duration> {
        None
    }

    /// `None` uses the configured default; `Some(Duration::ZERO)` disables
    /// the timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Everything a task body gets to see about the current attempt.
#[derive(Debug, Clone)]
pub struct RunContext {
    id: TaskId,
    attempt: u32,
    input: Arc<TaskInput>,
    outputs: Arc<[Arc<dyn Target>]>,
}

impl RunContext {
    pub fn new(
        id: TaskId,
        attempt: u32,
        input: Arc<TaskInput>,
        outputs: Arc<[Arc<dyn Target>]>,
    ) -> Self {
        Self {
            id,
            attempt,
            input,
            outputs,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Outputs of the dependencies.
    pub fn input(&self) -> &TaskInput {
        &self.input
    }

    /// This task's own declared outputs.
    pub fn outputs(&self) -> &[Arc<dyn Target>] {
        &self.outputs
    }
}
