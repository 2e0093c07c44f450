#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use workdag::config::Config;
use workdag::dag::DependencyGraph;
use workdag::task::TaskBuilder;

/// Config tuned for tests: no retries, no retry delay, a short poll
/// interval and two workers.
pub fn test_config() -> Config {
    Config::default()
        .with_max_retry(0)
        .with_retry_interval(Duration::ZERO)
        .with_task_wait(Duration::from_millis(5))
        .with_workers(2)
}

/// Builder for a shared `DependencyGraph`.
pub struct GraphBuilder {
    config: Config,
    tasks: Vec<TaskBuilder>,
}

impl GraphBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: TaskBuilder) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Arc<DependencyGraph> {
        let mut graph = DependencyGraph::new(&self.config);
        for task in self.tasks {
            graph
                .add_task(task.build())
                .expect("Failed to add task to graph");
        }
        Arc::new(graph)
    }
}

/// A task that sleeps for `duration` and then succeeds.
pub fn sleeping_task(id: &str, duration: Duration) -> TaskBuilder {
    TaskBuilder::new(id).run(move |_| async move {
        tokio::time::sleep(duration).await;
        Ok(())
    })
}
