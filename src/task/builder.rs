// src/task/builder.rs

//! Closure-backed tasks.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use workdag::task::{LocalTarget, TaskBuilder};
//!
//! let report = Arc::new(LocalTarget::new("out/report.csv"));
//! let out = report.clone();
//! let task = TaskBuilder::new("report")
//!     .requires(vec!["extract", "transform"])
//!     .output(report)
//!     .timeout(Duration::from_secs(30))
//!     .run(move |_ctx| {
//!         let out = out.clone();
//!         async move { out.write("id,total\n") }
//!     })
//!     .build();
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::task::{BoxFuture, RunContext, Target, Task};
use crate::types::{Dependencies, TaskId};

type RunFn = Arc<dyn Fn(RunContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
type OutputFn = Arc<dyn Fn() -> Vec<Arc<dyn Target>> + Send + Sync>;

/// Builder for [`FnTask`].
#[derive(Clone)]
pub struct TaskBuilder {
    id: TaskId,
    requires: Dependencies<TaskId>,
    outputs: Vec<Arc<dyn Target>>,
    output_fn: Option<OutputFn>,
    run: Option<RunFn>,
    max_retry: Option<u32>,
    retry_interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl TaskBuilder {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            requires: Dependencies::None,
            outputs: Vec::new(),
            output_fn: None,
            run: None,
            max_retry: None,
            retry_interval: None,
            timeout: None,
        }
    }

    /// Dependencies by id: a single `&str`, a `Vec` of ids, or a keyed map.
    pub fn requires(mut self, deps: impl Into<Dependencies<TaskId>>) -> Self {
        self.requires = deps.into();
        self
    }

    /// Append one output target.
    pub fn output(mut self, target: Arc<dyn Target>) -> Self {
        self.outputs.push(target);
        self
    }

    pub fn outputs(mut self, targets: Vec<Arc<dyn Target>>) -> Self {
        self.outputs.extend(targets);
        self
    }

    /// Compute outputs lazily; evaluated once when the task joins a graph and
    /// appended to any targets given through [`TaskBuilder::output`].
    pub fn output_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<Arc<dyn Target>> + Send + Sync + 'static,
    {
        self.output_fn = Some(Arc::new(f));
        self
    }

    pub fn run<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.run = Some(Arc::new(
            move |ctx| -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = Some(max_retry);
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    /// `Duration::ZERO` disables the configured default timeout for this task.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> FnTask {
        FnTask { spec: self }
    }
}

/// A [`Task`] assembled from a [`TaskBuilder`].
#[derive(Clone)]
pub struct FnTask {
    spec: TaskBuilder,
}

impl fmt::Debug for FnTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("id", &self.spec.id)
            .field("requires", &self.spec.requires)
            .field("has_run", &self.spec.run.is_some())
            .finish_non_exhaustive()
    }
}

impl Task for FnTask {
    fn id(&self) -> &str {
        &self.spec.id
    }

    fn requires(&self) -> Dependencies<TaskId> {
        self.spec.requires.clone()
    }

    fn output(&self) -> Vec<Arc<dyn Target>> {
        let mut outputs = self.spec.outputs.clone();
        if let Some(f) = &self.spec.output_fn {
            outputs.extend(f());
        }
        outputs
    }

    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, anyhow::Result<()>> {
        match &self.spec.run {
            Some(f) => f(ctx.clone()),
            None => {
                let id = self.spec.id.clone();
                Box::pin(async move { Err(crate::errors::TaskError::NotImplemented(id).into()) })
            }
        }
    }

    fn max_retry(&self) -> Option<u32> {
        self.spec.max_retry
    }

    fn retry_interval(&self) -> Option<Duration> {
        self.spec.retry_interval
    }

    fn timeout(&self) -> Option<Duration> {
        self.spec.timeout
    }
}
