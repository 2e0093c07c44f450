use std::sync::{Arc, Mutex};

use workdag::task::TaskBuilder;

/// Records which task bodies ran, in the order they started.
///
/// The task factories hand out `TaskBuilder`s whose bodies log their id here
/// before doing anything else, so dependency order and skip behaviour can be
/// asserted after a run.
#[derive(Debug, Clone, Default)]
pub struct RunRecorder {
    executed: Arc<Mutex<Vec<String>>>,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &str) {
        self.executed.lock().unwrap().push(id.to_string());
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Number of attempts recorded for `id`.
    pub fn count(&self, id: &str) -> usize {
        self.executed().iter().filter(|t| *t == id).count()
    }

    /// Index of the first attempt of `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.executed().iter().position(|t| t == id)
    }

    /// A task that records itself and succeeds.
    pub fn task(&self, id: &str) -> TaskBuilder {
        let recorder = self.clone();
        TaskBuilder::new(id).run(move |ctx| {
            let recorder = recorder.clone();
            async move {
                recorder.record(ctx.id());
                Ok(())
            }
        })
    }

    /// A task that records itself and fails every attempt.
    pub fn failing_task(&self, id: &str) -> TaskBuilder {
        let recorder = self.clone();
        TaskBuilder::new(id).run(move |ctx| {
            let recorder = recorder.clone();
            async move {
                recorder.record(ctx.id());
                Err::<(), _>(anyhow::anyhow!(
                    "{} failed on attempt {}",
                    ctx.id(),
                    ctx.attempt()
                ))
            }
        })
    }

    /// A task that fails its first `failures` attempts and then succeeds.
    pub fn flaky_task(&self, id: &str, failures: u32) -> TaskBuilder {
        let recorder = self.clone();
        TaskBuilder::new(id).run(move |ctx| {
            let recorder = recorder.clone();
            async move {
                recorder.record(ctx.id());
                if ctx.attempt() <= failures {
                    anyhow::bail!("transient failure on attempt {}", ctx.attempt());
                }
                Ok(())
            }
        })
    }
}
