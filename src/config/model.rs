// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Process-wide defaults as read from a TOML file.
///
/// ```toml
/// max_retry = 3
/// retry_interval = 300   # seconds
/// timeout = 0            # seconds, 0 = no timeout
/// workers = 4
/// task_wait_ms = 1000
/// run_all = false
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Seconds added to a task's visibility time on each retry.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,

    /// Per-attempt timeout in seconds. `0` is kept for compatibility and
    /// means "no timeout".
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Poll interval of the worker loop, in milliseconds.
    #[serde(default = "default_task_wait_ms")]
    pub task_wait_ms: u64,

    #[serde(default)]
    pub run_all: bool,
}

fn default_max_retry() -> u32 {
    3
}

fn default_retry_interval() -> u64 {
    300
}

fn default_workers() -> usize {
    1
}

fn default_task_wait_ms() -> u64 {
    1000
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            max_retry: default_max_retry(),
            retry_interval: default_retry_interval(),
            timeout: None,
            workers: default_workers(),
            task_wait_ms: default_task_wait_ms(),
            run_all: false,
        }
    }
}

/// Validated configuration.
///
/// Passed explicitly to [`crate::dag::DependencyGraph::new`] (task retry
/// defaults are read at construction) and to
/// [`crate::exec::LocalExecutor::new`] (timeout default, pool size, poll
/// interval). Nothing reads it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_retry: u32,
    pub retry_interval: Duration,
    /// `None` means no timeout.
    pub timeout: Option<Duration>,
    pub workers: usize,
    pub task_wait: Duration,
    /// Execute every task even when its outputs already exist.
    pub run_all: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new_unchecked(RawConfig::default())
    }
}

impl Config {
    /// Convert without validation. Callers outside this module go through
    /// `Config::try_from(raw)`.
    pub(crate) fn new_unchecked(raw: RawConfig) -> Self {
        Self {
            max_retry: raw.max_retry,
            retry_interval: Duration::from_secs(raw.retry_interval),
            timeout: raw
                .timeout
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            workers: raw.workers,
            task_wait: Duration::from_millis(raw.task_wait_ms),
            run_all: raw.run_all,
        }
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// A zero duration is normalised to "no timeout".
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Clamped to at least one worker.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_task_wait(mut self, wait: Duration) -> Self {
        self.task_wait = wait;
        self
    }

    pub fn with_run_all(mut self, run_all: bool) -> Self {
        self.run_all = run_all;
        self
    }
}
