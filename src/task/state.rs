// src/task/state.rs

//! Lifecycle states, events, and the transition table.

use std::fmt;
use std::str::FromStr;

use crate::errors::WorkdagError;

/// Lifecycle state of a task.
///
/// `Pending` is the initial state. The four states after `Running` are
/// terminal: no further transitions are accepted once a task reaches one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Skipped,
    Failed,
    RequiresFailed,
}

impl TaskState {
    pub fn is_success(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Skipped)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, TaskState::Failed | TaskState::RequiresFailed)
    }

    pub fn is_finished(self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Skipped => "skipped",
            TaskState::Failed => "failed",
            TaskState::RequiresFailed => "requires_failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that drive a task through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// An execution attempt begins.
    Start,
    /// The attempt succeeded.
    Complete,
    /// Work was already satisfied; counts as success.
    Skip,
    /// The attempt failed but will be retried.
    Pend,
    /// The attempt failed and no retries remain.
    Fail,
    /// A dependency finished unsuccessfully; the task never runs.
    RequiresFail,
}

impl Event {
    pub const ALL: [Event; 6] = [
        Event::Start,
        Event::Complete,
        Event::Skip,
        Event::Pend,
        Event::Fail,
        Event::RequiresFail,
    ];

    /// State the task is in after this event is applied.
    pub fn target_state(self) -> TaskState {
        match self {
            Event::Start => TaskState::Running,
            Event::Complete => TaskState::Completed,
            Event::Skip => TaskState::Skipped,
            Event::Pend => TaskState::Pending,
            Event::Fail => TaskState::Failed,
            Event::RequiresFail => TaskState::RequiresFailed,
        }
    }

    /// Whether this event may be applied to a task in state `from`.
    pub fn allowed_from(self, from: TaskState) -> bool {
        match self {
            Event::Start | Event::Skip | Event::RequiresFail => from == TaskState::Pending,
            Event::Complete | Event::Pend | Event::Fail => from == TaskState::Running,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Complete => "complete",
            Event::Skip => "skip",
            Event::Pend => "pend",
            Event::Fail => "fail",
            Event::RequiresFail => "requires_fail",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = WorkdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| WorkdagError::InvalidEvent(s.to_string()))
    }
}
