// src/exec/mod.rs

//! Execution layer.
//!
//! This module runs the tasks of a [`crate::dag::DependencyGraph`] on a pool
//! of Tokio workers and drives each task's lifecycle to a terminal state.
//!
//! - [`executor`] owns the worker pool and the per-worker scheduling loop.
//! - [`attempt`] runs one attempt of a task body under an optional timeout.
//! - [`queue`] is the shared FIFO the workers pop from and push back to.
//! - [`summary`] reports the per-task outcome once a run is over.

pub mod attempt;
pub mod executor;
pub mod queue;
pub mod summary;

pub use attempt::run_attempt;
pub use executor::LocalExecutor;
pub use queue::WorkQueue;
pub use summary::{RunSummary, TaskSummary};
