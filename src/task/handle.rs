// src/task/handle.rs

//! A node bound to its upstream nodes, as handed to the executor.

use std::sync::Arc;

use tokio::time::Instant;

use crate::task::{RunContext, TaskInput, TaskNode};

/// A [`TaskNode`] together with the nodes it depends on and its derived input
/// view. Built by [`crate::dag::DependencyGraph::handle`].
#[derive(Debug, Clone)]
pub struct TaskHandle {
    node: Arc<TaskNode>,
    upstream: Vec<Arc<TaskNode>>,
    input: Arc<TaskInput>,
}

impl TaskHandle {
    pub(crate) fn new(node: Arc<TaskNode>, upstream: Vec<Arc<TaskNode>>, input: TaskInput) -> Self {
        Self {
            node,
            upstream,
            input: Arc::new(input),
        }
    }

    pub fn node(&self) -> &Arc<TaskNode> {
        &self.node
    }

    pub fn id(&self) -> &str {
        self.node.id()
    }

    pub fn upstream(&self) -> &[Arc<TaskNode>] {
        &self.upstream
    }

    pub fn input(&self) -> &TaskInput {
        &self.input
    }

    /// Every dependency is done, either in this session or through its
    /// persisted outputs.
    ///
    /// With `run_all` every dependency is going to run again, so only a
    /// success in this session counts.
    pub fn is_ready(&self, run_all: bool) -> bool {
        if run_all {
            self.upstream.iter().all(|dep| dep.is_success())
        } else {
            self.upstream.iter().all(|dep| dep.is_completed())
        }
    }

    /// Some dependency reached a terminal state without succeeding.
    pub fn requires_failed(&self) -> bool {
        self.upstream
            .iter()
            .any(|dep| dep.is_finished() && !dep.is_success())
    }

    pub fn is_runnable(&self, now: Instant, run_all: bool) -> bool {
        self.is_ready(run_all) && self.node.is_visible(now)
    }

    /// Context for the next attempt.
    pub fn context(&self) -> RunContext {
        RunContext::new(
            self.node.id().to_string(),
            self.node.tries() + 1,
            Arc::clone(&self.input),
            Arc::clone(self.node.outputs()),
        )
    }
}
