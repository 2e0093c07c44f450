// src/exec/executor.rs

//! Local worker pool.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{Instant, sleep};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::Config;
use crate::dag::DependencyGraph;
use crate::errors::{Result, TaskError, WorkdagError};
use crate::exec::attempt::run_attempt;
use crate::exec::queue::WorkQueue;
use crate::exec::summary::RunSummary;
use crate::task::{Event, TaskHandle, TaskNode};

/// Runs every task of a [`DependencyGraph`] to a terminal state with a fixed
/// pool of workers sharing one queue.
///
/// Each worker repeatedly pops a task and:
/// - marks it `requires_failed` if a dependency finished unsuccessfully,
/// - marks it `skipped` if its outputs already exist (unless `run_all`),
/// - pushes it back and waits if it is not runnable yet,
/// - otherwise runs it, then completes it or applies the retry policy.
///
/// A worker stops once the queue is empty and the last task in topological
/// order is finished.
#[derive(Debug)]
pub struct LocalExecutor {
    graph: Arc<DependencyGraph>,
    config: Config,
}

impl LocalExecutor {
    pub fn new(graph: Arc<DependencyGraph>, config: Config) -> Self {
        Self { graph, config }
    }

    /// Override the configured worker count (clamped to at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config = self.config.with_workers(workers);
        self
    }

    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the graph.
    ///
    /// Returns `Ok(true)` iff every task ended `completed` or `skipped`.
    /// Errors are reserved for an invalid graph and for lifecycle misuse;
    /// failing task bodies only show up as `Ok(false)`.
    pub async fn execute(&self) -> Result<bool> {
        let order = self.graph.tsort()?;
        let handles = order
            .iter()
            .map(|node| self.graph.handle(node).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let shared = Arc::new(Shared {
            queue: handles.into_iter().collect(),
            last: order.last().cloned(),
            config: self.config.clone(),
        });

        let workers = self.config.workers.max(1);
        info!(tasks = order.len(), workers, "starting local executor");

        let mut pool = JoinSet::new();
        for index in 0..workers {
            let worker = Worker {
                shared: Arc::clone(&shared),
            };
            pool.spawn(worker.run().instrument(info_span!("worker", worker = index)));
        }

        let mut failure = None;
        while let Some(joined) = pool.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_err) if join_err.is_cancelled() => continue,
                Err(join_err) => Err(WorkdagError::WorkerFailed(join_err.to_string())),
            };
            if let Err(err) = result {
                error!(error = %err, "worker stopped with an error; aborting remaining workers");
                pool.abort_all();
                failure.get_or_insert(err);
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let success = order.iter().all(|node| node.is_success());
        info!(success, "local executor finished");
        Ok(success)
    }

    /// Per-task outcome in topological order.
    pub fn summary(&self) -> Result<RunSummary> {
        RunSummary::from_graph(&self.graph)
    }
}

/// State shared by all workers of one `execute` call.
#[derive(Debug)]
struct Shared {
    queue: WorkQueue<Arc<TaskHandle>>,
    /// Last task in topological order; its completion is the stop signal.
    last: Option<Arc<TaskNode>>,
    config: Config,
}

struct Worker {
    shared: Arc<Shared>,
}

impl Worker {
    async fn run(self) -> Result<()> {
        debug!("worker started");

        while let Some(task) = self.dequeue().await? {
            if !task.is_runnable(Instant::now(), self.shared.config.run_all) {
                self.enqueue(task);
                sleep(self.shared.config.task_wait).await;
                continue;
            }

            self.execute_task(&task).await?;
        }

        debug!("worker stopped");
        Ok(())
    }

    /// Pop the next task that needs a decision, settling tasks that do not
    /// need to run on the way. `None` means this worker is done.
    async fn dequeue(&self) -> Result<Option<Arc<TaskHandle>>> {
        loop {
            let Some(task) = self.shared.queue.pop() else {
                if self.no_more_work() {
                    return Ok(None);
                }
                sleep(self.shared.config.task_wait).await;
                continue;
            };

            let node = task.node();
            debug!(task = %node.id(), "dequeue");

            if task.requires_failed() {
                node.trigger(Event::RequiresFail)?;
                info!(task = %node.id(), state = %node.state(), "task has a failed dependency");
                continue;
            }

            if !self.shared.config.run_all && node.is_completed() {
                node.trigger(Event::Skip)?;
                info!(task = %node.id(), state = %node.state(), "task is already completed");
                continue;
            }

            return Ok(Some(task));
        }
    }

    fn no_more_work(&self) -> bool {
        self.shared
            .last
            .as_ref()
            .is_none_or(|last| last.is_finished())
    }

    fn enqueue(&self, task: Arc<TaskHandle>) {
        debug!(task = %task.id(), "enqueue");
        self.shared.queue.push(task);
    }

    async fn execute_task(&self, task: &Arc<TaskHandle>) -> Result<()> {
        let node = task.node();
        let timeout = node.effective_timeout(self.shared.config.timeout);

        info!(task = %node.id(), attempt = node.tries() + 1, "run");
        node.trigger(Event::Start)?;

        match run_attempt(task, timeout).await {
            Ok(()) => {
                node.trigger(Event::Complete)?;
                info!(
                    task = %node.id(),
                    state = %node.state(),
                    elapsed = %node.elapsed_time(),
                    "task finished"
                );
                Ok(())
            }
            Err(err) => self.handle_error(task, err),
        }
    }

    fn handle_error(&self, task: &Arc<TaskHandle>, err: TaskError) -> Result<()> {
        let node = task.node();
        node.record_error(&err);

        if node.retry() {
            node.trigger(Event::Pend)?;
            error!(
                task = %node.id(),
                kind = err.kind(),
                error = %err,
                tries = node.tries(),
                retry_interval = ?node.retry_interval(),
                "attempt failed; will retry after the retry interval"
            );
            self.enqueue(Arc::clone(task));
        } else {
            node.trigger(Event::Fail)?;
            error!(
                task = %node.id(),
                kind = err.kind(),
                error = %err,
                tries = node.tries(),
                "attempt failed and max retry count reached; task failed"
            );
            info!(
                task = %node.id(),
                state = %node.state(),
                elapsed = %node.elapsed_time(),
                "task finished"
            );
            if matches!(err, TaskError::Timeout(_)) {
                warn!(task = %node.id(), "last attempt exceeded its timeout");
            }
            debug!(task = %node.id(), trace = ?err, "failure trace");
        }

        Ok(())
    }
}
