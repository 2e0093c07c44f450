// tests/retry_and_timeout.rs
//
// These run on a paused clock, so retry intervals and timeouts elapse
// instantly once every worker is idle.

mod common;
use crate::common::{GraphBuilder, RunRecorder, init_tracing, sleeping_task, state_of, test_config};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use workdag::exec::LocalExecutor;
use workdag::task::{TaskBuilder, TaskState};

#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_after_max_retry_plus_one_attempts() {
    init_tracing();

    let recorder = RunRecorder::new();
    let cfg = test_config().with_max_retry(2);
    let graph = GraphBuilder::new(&cfg)
        .with_task(recorder.failing_task("flaky_api"))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(!ok);
    let node = graph.task("flaky_api").unwrap();
    assert_eq!(node.state(), TaskState::Failed);
    assert_eq!(node.tries(), 3);
    assert_eq!(recorder.count("flaky_api"), 3);
    assert!(
        node.last_error()
            .unwrap()
            .message
            .contains("failed on attempt 3")
    );
}

#[tokio::test(start_paused = true)]
async fn transient_failures_recover_within_retry_budget() {
    init_tracing();

    let recorder = RunRecorder::new();
    let cfg = test_config().with_max_retry(3);
    let graph = GraphBuilder::new(&cfg)
        .with_task(recorder.flaky_task("fetch", 2))
        .with_task(recorder.task("store").requires("fetch"))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(state_of(&graph, "fetch"), TaskState::Completed);
    assert_eq!(graph.task("fetch").unwrap().tries(), 2);
    assert_eq!(recorder.count("fetch"), 3);
    assert_eq!(recorder.count("store"), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_waits_for_the_retry_interval() {
    let recorder = RunRecorder::new();
    let cfg = test_config();
    let started = Instant::now();
    let graph = GraphBuilder::new(&cfg)
        .with_task(
            recorder
                .flaky_task("upload", 1)
                .max_retry(1)
                .retry_interval(Duration::from_secs(30)),
        )
        .build();

    let ok = LocalExecutor::new(graph, cfg).execute().await.unwrap();

    assert!(ok);
    assert_eq!(recorder.count("upload"), 2);
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_times_out_and_fails() {
    init_tracing();

    let cfg = test_config().with_timeout(Some(Duration::from_secs(1)));
    let graph = GraphBuilder::new(&cfg)
        .with_task(sleeping_task("slow", Duration::from_secs(2)))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(!ok);
    let node = graph.task("slow").unwrap();
    assert_eq!(node.state(), TaskState::Failed);
    assert_eq!(node.tries(), 1);
    assert!(node.last_error().unwrap().is_timeout());
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempts_are_retried_before_failing() {
    init_tracing();

    let cfg = test_config()
        .with_max_retry(1)
        .with_timeout(Some(Duration::from_secs(1)));
    let graph = GraphBuilder::new(&cfg)
        .with_task(sleeping_task("hung", Duration::from_secs(2)))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(!ok);
    let node = graph.task("hung").unwrap();
    assert_eq!(node.state(), TaskState::Failed);
    assert_eq!(node.tries(), 2);
    assert!(node.last_error().unwrap().is_timeout());
    assert_eq!(node.elapsed_time(), "00:00:01");
}

#[tokio::test(start_paused = true)]
async fn zero_task_timeout_overrides_configured_limit() {
    let cfg = test_config().with_timeout(Some(Duration::from_secs(1)));
    let graph = GraphBuilder::new(&cfg)
        .with_task(sleeping_task("patient", Duration::from_secs(2)).timeout(Duration::ZERO))
        .with_task(sleeping_task("bounded", Duration::from_millis(500)).timeout(Duration::from_secs(5)))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(state_of(&graph, "patient"), TaskState::Completed);
    assert_eq!(state_of(&graph, "bounded"), TaskState::Completed);
}

#[tokio::test]
async fn task_without_body_fails_as_not_implemented() {
    let cfg = test_config();
    let graph = GraphBuilder::new(&cfg)
        .with_task(TaskBuilder::new("todo"))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(!ok);
    let failure = graph.task("todo").unwrap().last_error().unwrap();
    assert_eq!(failure.kind, "NotImplementedError");
    assert!(failure.message.contains("todo"));
}

#[tokio::test]
async fn panicking_body_fails_the_task() {
    let cfg = test_config();
    let graph = GraphBuilder::new(&cfg)
        .with_task(TaskBuilder::new("boom").run(|_| async {
            if true {
                panic!("bad input row");
            }
            Ok(())
        }))
        .with_task(TaskBuilder::new("after").requires("boom").run(|_| async { Ok(()) }))
        .build();

    let ok = LocalExecutor::new(Arc::clone(&graph), cfg)
        .execute()
        .await
        .unwrap();

    assert!(!ok);
    let failure = graph.task("boom").unwrap().last_error().unwrap();
    assert_eq!(failure.kind, "PanicError");
    assert!(failure.message.contains("bad input row"));
    assert_eq!(state_of(&graph, "after"), TaskState::RequiresFailed);
}
