#![allow(dead_code)]

pub use workdag_test_utils::builders::{GraphBuilder, sleeping_task, test_config};
pub use workdag_test_utils::recorder::RunRecorder;
pub use workdag_test_utils::{init_tracing, with_timeout};

use std::sync::Arc;

use workdag::dag::DependencyGraph;
use workdag::task::TaskState;

/// Final state of every task, by id.
pub fn state_of(graph: &Arc<DependencyGraph>, id: &str) -> TaskState {
    graph
        .task(id)
        .unwrap_or_else(|| panic!("unknown task {id}"))
        .state()
}
