// src/lib.rs

pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod task;
pub mod types;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::exec::LocalExecutor;

/// High-level entry point.
///
/// Runs every task of `graph` with a [`LocalExecutor`] and logs the per-task
/// outcome table. Returns whether every task ended `completed` or `skipped`.
///
/// The graph is expected to have been built with the same `config`, since
/// task retry defaults are resolved when tasks are added.
pub async fn run(graph: Arc<DependencyGraph>, config: Config) -> Result<bool> {
    let executor = LocalExecutor::new(graph, config);
    let success = executor.execute().await?;

    let summary = executor.summary()?;
    if success {
        info!("run succeeded\n{summary}");
    } else {
        warn!("run finished with failures\n{summary}");
    }

    Ok(success)
}
