mod common;

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use common::{example_items, load_store, store_path, ScriptedDecisions, ScriptedExecutor};
use part_harvest::error::StoreError;
use part_harvest::models::ProgressStatus;
use part_harvest::{AttemptResult, Orchestrator, RunDecision, RunSettings, RunStatus};

fn settings() -> RunSettings {
    RunSettings {
        pacing: Duration::ZERO,
        max_retries: 3,
    }
}

#[tokio::test]
async fn failed_part_is_skipped_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new()
        .script("A/X/2", vec![AttemptResult::failure("下载超时", true)]);
    let decisions = ScriptedDecisions::new(vec![RunDecision::Skip]);

    let mut orchestrator = Orchestrator::new(load_store(&path), executor, decisions, settings());
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.status, RunStatus::Finished);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.completed, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.already_done, 0);
    assert_eq!(report.not_reached(), 0);

    let asked = &orchestrator.decisions().asked;
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0], ("A/X/2".to_string(), "下载超时".to_string(), true));

    let store = load_store(&path);
    assert_eq!(store.status("A/X/1"), ProgressStatus::Done);
    assert_eq!(store.status("A/X/2"), ProgressStatus::Skipped);
    assert_eq!(store.status("A/Y/1"), ProgressStatus::Done);
    assert_eq!(store.status("A/Y/2"), ProgressStatus::Done);
    assert_eq!(store.get("A/X/2").unwrap().last_error.as_deref(), Some("下载超时"));
}

#[tokio::test]
async fn second_run_performs_no_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let mut first = Orchestrator::new(
        load_store(&path),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings(),
    );
    assert_ok!(first.run(&items).await);

    let mut second = Orchestrator::new(
        load_store(&path),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings(),
    );
    let report = assert_ok!(second.run(&items).await);

    assert!(second.executor().calls.is_empty());
    assert_eq!(report.already_done, 4);
    assert_eq!(report.completed, 0);
    assert_eq!(report.status, RunStatus::Finished);
}

#[tokio::test]
async fn done_items_are_never_attempted_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let mut store = load_store(&path);
    store.record("A/X/1", ProgressStatus::InProgress, None).unwrap();
    store.record("A/X/1", ProgressStatus::Done, None).unwrap();

    let executor = ScriptedExecutor::new()
        .script("A/X/1", vec![AttemptResult::failure("不应被调用", false)]);
    let mut orchestrator =
        Orchestrator::new(store, executor, ScriptedDecisions::default(), settings());
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(orchestrator.executor().calls_for("A/X/1"), 0);
    assert_eq!(report.already_done, 1);
    assert_eq!(report.completed, 3);

    let record = load_store(&path).get("A/X/1").cloned().unwrap();
    assert_eq!(record.status, ProgressStatus::Done);
    assert_eq!(record.attempts, 1);
}

#[tokio::test]
async fn abort_keeps_earlier_progress_and_resume_picks_up_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new()
        .script("A/Y/1", vec![AttemptResult::failure("需要人工验证", true)]);
    let decisions = ScriptedDecisions::new(vec![RunDecision::Abort]);
    let mut orchestrator = Orchestrator::new(load_store(&path), executor, decisions, settings());
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.aborted_at.as_deref(), Some("A/Y/1"));
    assert_eq!(report.completed, 2);
    assert_eq!(report.not_reached(), 2);
    assert_eq!(orchestrator.executor().calls_for("A/Y/2"), 0);

    let store = load_store(&path);
    assert!(store.is_done("A/X/1"));
    assert!(store.is_done("A/X/2"));
    assert!(!store.is_done("A/Y/1"));
    assert!(store.get("A/Y/2").is_none());

    let mut resumed = Orchestrator::new(
        load_store(&path),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings(),
    );
    let report = assert_ok!(resumed.run(&items).await);

    assert_eq!(resumed.executor().calls, vec!["A/Y/1", "A/Y/2"]);
    assert_eq!(report.already_done, 2);
    assert_eq!(report.completed, 2);
}

#[tokio::test]
async fn retry_then_success_counts_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new().script(
        "A/X/1",
        vec![
            AttemptResult::failure("网络错误", true),
            AttemptResult::failure("网络错误", true),
        ],
    );
    let decisions = ScriptedDecisions::new(vec![RunDecision::Retry, RunDecision::Retry]);
    let mut orchestrator = Orchestrator::new(load_store(&path), executor, decisions, settings());
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.completed, 4);
    assert_eq!(orchestrator.executor().calls_for("A/X/1"), 3);

    let record = load_store(&path).get("A/X/1").cloned().unwrap();
    assert_eq!(record.status, ProgressStatus::Done);
    assert_eq!(record.attempts, 3);
    assert_eq!(record.last_error, None);
}

#[tokio::test]
async fn retry_bound_forces_skip() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let failures = vec![AttemptResult::failure("服务器错误", true); 10];
    let executor = ScriptedExecutor::new().script("A/X/2", failures);
    let decisions = ScriptedDecisions::new(vec![RunDecision::Retry; 10]);
    let settings = RunSettings {
        max_retries: 2,
        ..settings()
    };
    let mut orchestrator = Orchestrator::new(load_store(&path), executor, decisions, settings);
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.skipped, 1);
    assert_eq!(report.completed, 3);
    assert_eq!(orchestrator.executor().calls_for("A/X/2"), 3);
    assert_eq!(load_store(&path).status("A/X/2"), ProgressStatus::Skipped);
}

#[tokio::test]
async fn non_retryable_failure_still_reaches_the_operator() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new()
        .script("A/X/1", vec![AttemptResult::failure("未找到下载按钮", false)]);
    let mut orchestrator = Orchestrator::new(
        load_store(&path),
        executor,
        ScriptedDecisions::default(),
        settings(),
    );
    assert_ok!(orchestrator.run(&items).await);

    let asked = &orchestrator.decisions().asked;
    assert_eq!(asked.len(), 1);
    assert!(!asked[0].2);
}

#[tokio::test]
async fn skipped_items_are_attempted_on_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new()
        .script("A/Y/2", vec![AttemptResult::failure("超时", true)]);
    let mut first = Orchestrator::new(
        load_store(&path),
        executor,
        ScriptedDecisions::default(),
        settings(),
    );
    assert_ok!(first.run(&items).await);
    assert_eq!(load_store(&path).status("A/Y/2"), ProgressStatus::Skipped);

    let mut second = Orchestrator::new(
        load_store(&path),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings(),
    );
    let report = assert_ok!(second.run(&items).await);

    assert_eq!(second.executor().calls, vec!["A/Y/2"]);
    assert_eq!(report.completed, 1);
    assert_eq!(load_store(&path).get("A/Y/2").unwrap().attempts, 2);
}

#[tokio::test]
async fn empty_scope_finishes_without_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::new(
        load_store(&store_path(&dir)),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings(),
    );
    let report = assert_ok!(orchestrator.run(&[]).await);

    assert_eq!(report.total, 0);
    assert_eq!(report.status, RunStatus::Finished);
    assert!(orchestrator.executor().calls.is_empty());
    assert!(orchestrator.store().is_empty());
}

#[tokio::test]
async fn interrupt_stops_before_the_next_item() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let (tx, rx) = watch::channel(false);
    let executor = ScriptedExecutor::new().interrupt_after(2, tx);
    let mut orchestrator = Orchestrator::new(
        load_store(&path),
        executor,
        ScriptedDecisions::default(),
        settings(),
    )
    .with_shutdown(rx);
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.exit_code(), 130);
    assert_eq!(report.completed, 2);
    assert_eq!(orchestrator.executor().calls.len(), 2);

    // 中断时正在进行的分卷已经完整记录
    let store = load_store(&path);
    assert!(store.is_done("A/X/1"));
    assert!(store.is_done("A/X/2"));
    assert!(store.get("A/Y/1").is_none());
}

#[tokio::test(start_paused = true)]
async fn pacing_applies_only_between_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let mut store = load_store(&path);
    for key in ["A/X/1", "A/X/2"] {
        store.record(key, ProgressStatus::Done, None).unwrap();
    }

    let settings = RunSettings {
        pacing: Duration::from_secs(10),
        max_retries: 3,
    };
    let mut orchestrator = Orchestrator::new(
        store,
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings,
    );

    let start = Instant::now();
    let report = assert_ok!(orchestrator.run(&items).await);
    let elapsed = start.elapsed();

    assert_eq!(report.completed, 2);
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(20));
}

#[tokio::test]
async fn failed_write_stops_the_run_and_keeps_the_last_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let executor = ScriptedExecutor::new().break_store_after(2, &path);
    let mut orchestrator = Orchestrator::new(
        load_store(&path),
        executor,
        ScriptedDecisions::default(),
        settings(),
    );
    let err = assert_err!(orchestrator.run(&items).await);

    assert!(matches!(err, StoreError::Persist { .. }));
    assert_eq!(orchestrator.executor().calls, vec!["A/X/1", "A/X/2"]);

    // 最后一次成功写入的快照仍可读取
    let store = load_store(&path);
    assert!(store.is_done("A/X/1"));
    assert_eq!(store.status("A/X/2"), ProgressStatus::InProgress);
    assert!(store.get("A/Y/1").is_none());
}

#[tokio::test]
async fn interrupt_during_a_failed_attempt_skips_the_decision() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let (tx, rx) = watch::channel(false);
    let executor = ScriptedExecutor::new()
        .script("A/X/1", vec![AttemptResult::failure("连接被重置", true)])
        .interrupt_after(1, tx);
    let mut orchestrator = Orchestrator::new(
        load_store(&path),
        executor,
        ScriptedDecisions::new(vec![RunDecision::Retry]),
        settings(),
    )
    .with_shutdown(rx);
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.exit_code(), 130);
    assert!(orchestrator.decisions().asked.is_empty());
    assert_eq!(orchestrator.executor().calls, vec!["A/X/1"]);

    let record = load_store(&path).get("A/X/1").cloned().unwrap();
    assert_eq!(record.status, ProgressStatus::Failed);
    assert_eq!(record.last_error.as_deref(), Some("连接被重置"));
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_pacing_stops_before_the_next_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);
    let items = example_items();

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let _ = tx.send(true);
    });

    let settings = RunSettings {
        pacing: Duration::from_secs(60),
        max_retries: 3,
    };
    let mut orchestrator = Orchestrator::new(
        load_store(&path),
        ScriptedExecutor::new(),
        ScriptedDecisions::default(),
        settings,
    )
    .with_shutdown(rx);

    let start = Instant::now();
    let report = assert_ok!(orchestrator.run(&items).await);

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.completed, 1);
    assert_eq!(orchestrator.executor().calls, vec!["A/X/1"]);
    assert!(start.elapsed() < Duration::from_secs(60));
    assert!(load_store(&path).get("A/X/2").is_none());
}
