// src/exec/summary.rs

//! End-of-run report.

use std::fmt;

use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::task::{TaskFailure, TaskState};
use crate::types::TaskId;

/// Snapshot of one task after (or during) a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: TaskId,
    pub state: TaskState,
    pub tries: u32,
    pub elapsed_time: String,
    pub last_error: Option<TaskFailure>,
}

/// Per-task outcome in topological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks: Vec<TaskSummary>,
}

impl RunSummary {
    pub fn from_graph(graph: &DependencyGraph) -> Result<Self> {
        let tasks = graph
            .tsort()?
            .iter()
            .map(|node| TaskSummary {
                id: node.id().to_string(),
                state: node.state(),
                tries: node.tries(),
                elapsed_time: node.elapsed_time(),
                last_error: node.last_error(),
            })
            .collect();
        Ok(Self { tasks })
    }

    /// Every task ended `completed` or `skipped`.
    pub fn success(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_success())
    }

    pub fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    pub fn get(&self, id: &str) -> Option<&TaskSummary> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .tasks
            .iter()
            .map(|t| t.id.len())
            .max()
            .unwrap_or(0)
            .max("TASK".len());

        writeln!(f, "{:<width$}  {:<15}  {:>5}  {:>8}  ERROR", "TASK", "STATE", "TRIES", "ELAPSED")?;
        for t in &self.tasks {
            let error = t
                .last_error
                .as_ref()
                .filter(|_| t.state.is_failure())
                .map(|e| format!("{}: {}", e.kind, e.message))
                .unwrap_or_default();
            writeln!(
                f,
                "{:<width$}  {:<15}  {:>5}  {:>8}  {}",
                t.id,
                t.state.as_str(),
                t.tries,
                t.elapsed_time,
                error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Event, TaskBuilder};

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        graph.add_task(TaskBuilder::new("extract").build()).unwrap();
        graph
            .add_task(TaskBuilder::new("load").requires("extract").build())
            .unwrap();
        graph
    }

    #[test]
    fn snapshot_follows_topological_order() {
        let graph = graph();
        graph.task("extract").unwrap().trigger(Event::Skip).unwrap();

        let summary = RunSummary::from_graph(&graph).unwrap();
        let ids: Vec<&str> = summary.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["extract", "load"]);
        assert_eq!(summary.count(TaskState::Skipped), 1);
        assert_eq!(summary.count(TaskState::Pending), 1);
        assert!(!summary.success());
    }

    #[test]
    fn table_lists_failures() {
        let graph = graph();
        let extract = graph.task("extract").unwrap();
        extract.trigger(Event::Start).unwrap();
        extract.record_error(&crate::errors::TaskError::Failed(anyhow::anyhow!("boom")));
        extract.trigger(Event::Fail).unwrap();
        graph.task("load").unwrap().trigger(Event::RequiresFail).unwrap();

        let summary = RunSummary::from_graph(&graph).unwrap();
        let table = summary.to_string();
        assert!(table.lines().next().unwrap().starts_with("TASK"));
        assert!(table.contains("TaskFailed: boom"));
        assert!(table.contains("requires_failed"));
        assert_eq!(summary.get("load").unwrap().state, TaskState::RequiresFailed);
    }
}
