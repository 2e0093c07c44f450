// src/exec/attempt.rs

//! A single execution attempt of a task body.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use tracing::{Instrument, debug, info_span, warn};

use crate::errors::TaskError;
use crate::task::TaskHandle;

/// Run the task body once, optionally bounded by `timeout`.
///
/// The body runs on its own Tokio task and races the timeout. When the
/// timeout wins, the body is left to finish in the background and whatever
/// it returns is discarded; the attempt fails with [`TaskError::Timeout`].
/// A panicking body fails the attempt with [`TaskError::Panicked`].
pub async fn run_attempt(task: &TaskHandle, timeout: Option<Duration>) -> Result<(), TaskError> {
    let body = Arc::clone(task.node().task());
    let ctx = task.context();
    let attempt = ctx.attempt();

    debug!(task = %task.id(), attempt, ?timeout, "starting attempt");

    // Spawned tasks do not inherit the current span.
    let span = info_span!("task", task = %task.id(), attempt);
    let mut join = tokio::spawn(async move { body.run(&ctx).await }.instrument(span));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut join).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    task = %task.id(),
                    attempt,
                    timeout = ?limit,
                    "attempt timed out; detaching task body"
                );
                return Err(TaskError::Timeout(limit));
            }
        },
        None => join.await,
    };

    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(classify(err)),
        Err(join_err) => Err(TaskError::Panicked(join_error_message(join_err))),
    }
}

/// Keep a [`TaskError`] the body returned as-is; wrap anything else.
fn classify(err: anyhow::Error) -> TaskError {
    match err.downcast::<TaskError>() {
        Ok(task_err) => task_err,
        Err(other) => TaskError::Failed(other),
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task body was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
