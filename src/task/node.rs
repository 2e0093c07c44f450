// src/task/node.rs

//! A task inside a graph, with its mutable lifecycle.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::config::Config;
use crate::errors::{Result, TaskError, WorkdagError};
use crate::task::state::{Event, TaskState};
use crate::task::{Target, Task};
use crate::types::{Dependencies, TaskId};

/// Kind and message of the most recent failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: &'static str,
    pub message: String,
}

impl TaskFailure {
    pub fn is_timeout(&self) -> bool {
        self.kind == "TimeoutError"
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptTiming {
    start: Instant,
    end: Instant,
}

/// Mutable part of a node. Only touched under the node's lock.
#[derive(Debug)]
struct Lifecycle {
    state: TaskState,
    tries: u32,
    visible_at: Instant,
    /// Keyed by try index.
    timings: BTreeMap<u32, AttemptTiming>,
    /// Try index of the most recent `start`. Events leaving `running` close
    /// this slot even when `retry` has already bumped `tries`.
    started_try: u32,
    elapsed: Duration,
    last_error: Option<TaskFailure>,
}

/// A task registered in a [`crate::dag::DependencyGraph`].
///
/// Holds the immutable task definition (with its outputs evaluated once and
/// retry policy resolved against the config) and the lifecycle, which is
/// guarded by a per-node lock so workers can read and transition it
/// concurrently.
pub struct TaskNode {
    id: TaskId,
    task: Arc<dyn Task>,
    requires: Dependencies<TaskId>,
    outputs: Arc<[Arc<dyn Target>]>,
    max_retry: u32,
    retry_interval: Duration,
    timeout: Option<Duration>,
    lifecycle: Mutex<Lifecycle>,
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("id", &self.id)
            .field("requires", &self.requires)
            .field("outputs", &self.outputs)
            .field("lifecycle", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl TaskNode {
    pub fn new(task: Arc<dyn Task>, config: &Config) -> Self {
        let now = Instant::now();
        Self {
            id: task.id().to_string(),
            requires: task.requires(),
            outputs: task.output().into(),
            max_retry: task.max_retry().unwrap_or(config.max_retry),
            retry_interval: task.retry_interval().unwrap_or(config.retry_interval),
            timeout: task.timeout(),
            task,
            lifecycle: Mutex::new(Lifecycle {
                state: TaskState::Pending,
                tries: 0,
                visible_at: now,
                timings: BTreeMap::new(),
                started_try: 0,
                elapsed: Duration::ZERO,
                last_error: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn requires(&self) -> &Dependencies<TaskId> {
        &self.requires
    }

    pub fn outputs(&self) -> &Arc<[Arc<dyn Target>]> {
        &self.outputs
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Effective per-attempt timeout given the configured default.
    /// Zero means no timeout.
    pub fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        self.timeout.or(default).filter(|t| !t.is_zero())
    }

    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    /// Number of failed attempts recorded by [`TaskNode::retry`].
    pub fn tries(&self) -> u32 {
        self.lock().tries
    }

    pub fn visible_at(&self) -> Instant {
        self.lock().visible_at
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now >= self.lock().visible_at
    }

    /// Duration of the most recent try, as of its last transition.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// [`TaskNode::elapsed`] as `HH:MM:SS`.
    pub fn elapsed_time(&self) -> String {
        format_elapsed(self.elapsed())
    }

    pub fn last_error(&self) -> Option<TaskFailure> {
        self.lock().last_error.clone()
    }

    pub fn is_success(&self) -> bool {
        self.state().is_success()
    }

    pub fn is_failure(&self) -> bool {
        self.state().is_failure()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Done in the persisted sense: every declared output exists. A node
    /// without outputs falls back to its in-memory success.
    pub fn is_completed(&self) -> bool {
        if self.outputs.is_empty() {
            self.is_success()
        } else {
            self.outputs.iter().all(|o| o.exists())
        }
    }

    /// Record a failed attempt: bump `tries`, push the visibility time back
    /// by the retry interval, and report whether another attempt is allowed.
    ///
    /// Does not change the state; the caller picks the event.
    pub fn retry(&self) -> bool {
        let mut lc = self.lock();
        lc.tries += 1;
        lc.visible_at += self.retry_interval;
        lc.tries <= self.max_retry
    }

    pub fn record_error(&self, err: &TaskError) {
        self.lock().last_error = Some(TaskFailure {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Apply a lifecycle event atomically and return the new state.
    pub fn trigger(&self, event: Event) -> Result<TaskState> {
        let mut lc = self.lock();
        let now = Instant::now();

        if !event.allowed_from(lc.state) {
            return Err(WorkdagError::InvalidTransition {
                task: self.id.clone(),
                state: lc.state,
                event,
            });
        }

        let tries = lc.tries;
        let slot = if lc.state == TaskState::Running {
            lc.started_try
        } else {
            tries
        };
        if event == Event::Start {
            lc.started_try = tries;
        }
        let timing = lc
            .timings
            .entry(slot)
            .or_insert(AttemptTiming { start: now, end: now });
        timing.end = now;
        let elapsed = timing.end.duration_since(timing.start);

        let from = lc.state;
        lc.elapsed = elapsed;
        lc.state = event.target_state();

        trace!(task = %self.id, %from, %event, to = %lc.state, tries, "transition");
        Ok(lc.state)
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        // Every critical section leaves the lifecycle consistent, so a
        // poisoned lock is still usable.
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Format a duration as `HH:MM:SS`, truncating sub-second precision.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
