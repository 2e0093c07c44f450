// tests/outputs.rs

mod common;
use crate::common::{GraphBuilder, RunRecorder, init_tracing, state_of, test_config, with_timeout};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tempfile::TempDir;
use workdag::exec::LocalExecutor;
use workdag::task::{FlagTarget, LocalTarget, Target, TaskBuilder, TaskState};

#[tokio::test]
async fn task_with_existing_outputs_is_skipped() {
    init_tracing();

    let recorder = RunRecorder::new();
    let cfg = test_config();
    let graph = GraphBuilder::new(&cfg)
        .with_task(recorder.task("cached").output(Arc::new(FlagTarget::done("cached"))))
        .with_task(recorder.task("fresh").requires("cached"))
        .build();

    let ok = with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg).execute())
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(state_of(&graph, "cached"), TaskState::Skipped);
    assert_eq!(state_of(&graph, "fresh"), TaskState::Completed);
    assert_eq!(recorder.executed(), vec!["fresh".to_string()]);
}

#[tokio::test]
async fn run_all_executes_tasks_with_existing_outputs() {
    let recorder = RunRecorder::new();
    let cfg = test_config().with_run_all(true);
    let graph = GraphBuilder::new(&cfg)
        .with_task(recorder.task("cached").output(Arc::new(FlagTarget::done("cached"))))
        .build();

    let ok = with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg).execute())
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(state_of(&graph, "cached"), TaskState::Completed);
    assert_eq!(recorder.count("cached"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_all_waits_for_dependencies_with_existing_outputs() {
    init_tracing();

    let upstream_done = Arc::new(AtomicBool::new(false));
    let seen_by_downstream = Arc::new(AtomicBool::new(false));
    let cfg = test_config().with_run_all(true).with_workers(2);

    let done = Arc::clone(&upstream_done);
    let build = TaskBuilder::new("build")
        .output(Arc::new(FlagTarget::done("build")))
        .run(move |_| {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                done.store(true, Ordering::SeqCst);
                Ok(())
            }
        });

    let done = Arc::clone(&upstream_done);
    let seen = Arc::clone(&seen_by_downstream);
    let package = TaskBuilder::new("package")
        .requires("build")
        .output(Arc::new(FlagTarget::done("package")))
        .run(move |_| {
            let done = Arc::clone(&done);
            let seen = Arc::clone(&seen);
            async move {
                seen.store(done.load(Ordering::SeqCst), Ordering::SeqCst);
                Ok(())
            }
        });

    let graph = GraphBuilder::new(&cfg)
        .with_task(build)
        .with_task(package)
        .build();

    let ok = with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg).execute())
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(state_of(&graph, "build"), TaskState::Completed);
    assert_eq!(state_of(&graph, "package"), TaskState::Completed);
    assert!(
        seen_by_downstream.load(Ordering::SeqCst),
        "package started before build finished"
    );
}

/// Build `raw -> summary`, where each task writes its file target.
fn file_pipeline(dir: &TempDir, recorder: &RunRecorder) -> Vec<TaskBuilder> {
    let raw = Arc::new(LocalTarget::new(dir.path().join("raw.csv")));
    let summary = Arc::new(LocalTarget::new(dir.path().join("out/summary.txt")));

    let raw_out = Arc::clone(&raw);
    let rec = recorder.clone();
    let produce = TaskBuilder::new("raw")
        .output(raw.clone())
        .run(move |ctx| {
            let raw_out = Arc::clone(&raw_out);
            let rec = rec.clone();
            async move {
                rec.record(ctx.id());
                raw_out.write("a,1\nb,2\n")?;
                Ok(())
            }
        });

    let raw_in = Arc::clone(&raw);
    let summary_out = Arc::clone(&summary);
    let rec = recorder.clone();
    let mut deps = BTreeMap::new();
    deps.insert("rows".to_string(), "raw".to_string());
    let consume = TaskBuilder::new("summary")
        .requires(deps)
        .output(summary.clone())
        .run(move |ctx| {
            let raw_in = Arc::clone(&raw_in);
            let summary_out = Arc::clone(&summary_out);
            let rec = rec.clone();
            async move {
                rec.record(ctx.id());
                let rows = ctx.input().get("rows").expect("keyed input");
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].describe(), raw_in.describe());

                let lines = raw_in.read_to_string()?.lines().count();
                summary_out.write(format!("rows={lines}\n"))?;
                Ok(())
            }
        });

    vec![produce, consume]
}

#[tokio::test]
async fn file_outputs_persist_across_runs() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = test_config();

    let first = RunRecorder::new();
    let mut builder = GraphBuilder::new(&cfg);
    for task in file_pipeline(&dir, &first) {
        builder = builder.with_task(task);
    }
    let graph = builder.build();
    assert!(with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg.clone()).execute())
        .await
        .unwrap());
    assert_eq!(first.executed(), vec!["raw".to_string(), "summary".to_string()]);

    let written = std::fs::read_to_string(dir.path().join("out/summary.txt")).unwrap();
    assert_eq!(written, "rows=2\n");

    // Second session over the same files: nothing left to do.
    let second = RunRecorder::new();
    let mut builder = GraphBuilder::new(&cfg);
    for task in file_pipeline(&dir, &second) {
        builder = builder.with_task(task);
    }
    let graph = builder.build();
    assert!(with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg).execute())
        .await
        .unwrap());
    assert!(second.executed().is_empty());
    assert_eq!(state_of(&graph, "raw"), TaskState::Skipped);
    assert_eq!(state_of(&graph, "summary"), TaskState::Skipped);
}

#[tokio::test]
async fn removed_output_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    let cfg = test_config();

    let seed = RunRecorder::new();
    let mut builder = GraphBuilder::new(&cfg);
    for task in file_pipeline(&dir, &seed) {
        builder = builder.with_task(task);
    }
    assert!(with_timeout(LocalExecutor::new(builder.build(), cfg.clone()).execute())
        .await
        .unwrap());

    std::fs::remove_file(dir.path().join("out/summary.txt")).unwrap();

    let rerun = RunRecorder::new();
    let mut builder = GraphBuilder::new(&cfg);
    for task in file_pipeline(&dir, &rerun) {
        builder = builder.with_task(task);
    }
    let graph = builder.build();
    assert!(with_timeout(LocalExecutor::new(Arc::clone(&graph), cfg).execute())
        .await
        .unwrap());
    assert_eq!(rerun.executed(), vec!["summary".to_string()]);
    assert_eq!(state_of(&graph, "raw"), TaskState::Skipped);
    assert_eq!(state_of(&graph, "summary"), TaskState::Completed);
}

#[test]
fn local_target_tracks_the_filesystem() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("nested/out.txt"));

    assert!(!target.exists());
    target.write("done").unwrap();
    assert!(target.exists());
    assert_eq!(target.read_to_string().unwrap(), "done");
}
