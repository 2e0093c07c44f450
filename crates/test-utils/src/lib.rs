//! Shared helpers for workdag's integration tests.
//!
//! - [`builders`] has a fast [`builders::test_config`] and a graph builder.
//! - [`recorder`] hands out tasks that log which bodies actually ran.

pub mod builders;
pub mod recorder;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Executor logs (worker spans, retries, final failure traces) then show up
/// next to the failing test's output. The filter comes from `RUST_LOG`,
/// e.g. `RUST_LOG=workdag=debug`, and defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Fail the test if a run does not settle within ten seconds of wall time.
///
/// Not for paused-clock tests: there the virtual clock jumps over retry
/// intervals and would trip the limit.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("run did not settle within 10 seconds")
}
