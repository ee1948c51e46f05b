mod common;

use common::{Effect, Harness, Step, HOME, TARGET};
use std::time::Duration;
use waybill_assign::config::VisualErrorPolicy;
use waybill_assign::{
    CycleOutcome, EngineState, Record, RecordSet, RecordSource, RunReport, RunStatus, RunnerSettings,
};

fn records(values: &[&str]) -> RecordSet {
    values.iter().copied().collect()
}

async fn run(harness: &Harness, values: &[&str]) -> RunReport {
    tokio::time::timeout(Duration::from_secs(10), harness.runner.run(&records(values)))
        .await
        .expect("运行超时")
}

async fn finish(operator: tokio::task::JoinHandle<usize>) -> usize {
    tokio::time::timeout(Duration::from_secs(2), operator)
        .await
        .expect("操作员未完成")
        .unwrap()
}

#[tokio::test]
async fn test_error_free_run_visits_every_record_in_order() {
    let harness = Harness::new(VisualErrorPolicy::Skip);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(harness.executor.attempts(), vec!["A1", "A2", "A3"]);
    assert_eq!(harness.observer.progress(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(report.state, EngineState::Finished);
    assert_eq!(report.status, RunStatus::Finished);
    assert_eq!(report.completed, 3);
    assert_eq!(report.handled_errors, 0);
    assert_eq!(harness.runner.state(), EngineState::Finished);
    assert_eq!(harness.observer.statuses().last(), Some(&RunStatus::Finished));
    assert!(!harness.observer.statuses().contains(&RunStatus::Paused));

    // 结束后共享状态已重置
    assert_eq!(harness.coordinator.current_index(), 0);
    assert!(!harness.coordinator.is_paused());
    assert!(!harness.coordinator.is_cancelled());
}

#[tokio::test]
async fn test_action_failure_retries_same_record() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A2", Effect::Fail);
    let operator = harness.operator(vec![Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2", "A2", "A3"]);
    assert_eq!(
        report.outcomes,
        vec![CycleOutcome::Success, CycleOutcome::Success, CycleOutcome::Success]
    );
    assert_eq!(report.status, RunStatus::Finished);
    assert!(harness
        .observer
        .lines()
        .iter()
        .any(|l| l.contains("键盘操作失败")));
}

#[tokio::test]
async fn test_visual_error_skips_to_next_record() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A2", Effect::ShowError);
    let operator = harness.operator(vec![Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2", "A3"]);
    assert_eq!(
        report.outcomes,
        vec![
            CycleOutcome::Success,
            CycleOutcome::ErrorHandled,
            CycleOutcome::Success
        ]
    );
    assert_eq!(report.completed, 2);
    assert_eq!(report.handled_errors, 1);
    assert_eq!(report.status, RunStatus::Finished);

    let statuses = harness.observer.statuses();
    let paused_at = statuses.iter().position(|s| *s == RunStatus::Paused).unwrap();
    assert_eq!(statuses[paused_at + 1], RunStatus::Running);
    // 恢复后重新置前目标窗口
    assert!(harness.focus.calls().iter().filter(|t| *t == TARGET).count() >= 2);
}

#[tokio::test]
async fn test_error_on_last_record_finishes_without_pausing() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A2", Effect::ShowError);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(harness.executor.attempts(), vec!["A1", "A2"]);
    assert_eq!(
        report.outcomes,
        vec![CycleOutcome::Success, CycleOutcome::ErrorOnFinalRecord]
    );
    assert_eq!(report.state, EngineState::Finished);
    assert_eq!(report.status, RunStatus::Finished);
    assert!(!harness.observer.statuses().contains(&RunStatus::Paused));
    assert!(harness.screen.has_error());
}

#[tokio::test]
async fn test_two_records_first_errors_operator_resumes() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2"]);
    assert_eq!(report.status, RunStatus::Finished);
    assert_eq!(harness.observer.statuses().last(), Some(&RunStatus::Finished));
}

#[tokio::test]
async fn test_focus_failure_at_start_is_fatal() {
    let harness = Harness::without_focus();

    let report = run(&harness, &["A1", "A2"]).await;

    assert!(harness.executor.attempts().is_empty());
    assert_eq!(report.state, EngineState::Failed);
    assert_eq!(report.status, RunStatus::Error);
    assert_eq!(harness.runner.state(), EngineState::Failed);
    assert_eq!(harness.observer.statuses(), vec![RunStatus::Error]);
    assert!(harness.observer.lines().iter().any(|l| l.contains(TARGET)));
    assert_eq!(harness.coordinator.current_index(), 0);
}

#[tokio::test]
async fn test_data_view_focus_is_checked_first() {
    let settings = RunnerSettings {
        data_view_title: Some("Planilha".to_string()),
        ..common::fast_settings(VisualErrorPolicy::Skip)
    };
    let harness = Harness::build(settings, false);

    let report = run(&harness, &["A1"]).await;

    assert_eq!(report.state, EngineState::Failed);
    assert_eq!(harness.focus.calls().first().map(String::as_str), Some("Planilha"));
    assert!(harness.executor.attempts().is_empty());
}

#[tokio::test]
async fn test_empty_source_finishes_without_actions() {
    let harness = Harness::new(VisualErrorPolicy::Skip);

    let report = run(&harness, &[]).await;

    assert!(harness.executor.attempts().is_empty());
    assert_eq!(report.state, EngineState::Finished);
    assert_eq!(report.status, RunStatus::Finished);
    assert_eq!(report.total, 0);
    assert_eq!(harness.observer.statuses(), vec![RunStatus::Finished]);
}

#[tokio::test]
async fn test_cancel_while_paused_stops_run() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::Cancel]);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1"]);
    assert_eq!(report.outcomes, vec![CycleOutcome::Cancelled]);
    assert_eq!(report.status, RunStatus::Stopped);
    assert_eq!(report.state, EngineState::Finished);
    assert_eq!(harness.observer.statuses().last(), Some(&RunStatus::Stopped));
    // 取消后焦点交回操作员窗口
    assert!(harness.focus.calls().iter().any(|t| t == HOME));
    assert!(!harness.coordinator.is_cancelled());
}

#[tokio::test]
async fn test_manual_pause_executes_pending_record_after_resume() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ManualPause);
    let operator = harness.operator(vec![Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2", "A3"]);
    assert_eq!(report.completed, 3);
    assert_eq!(report.handled_errors, 0);
    assert!(harness.observer.statuses().contains(&RunStatus::Paused));
}

#[tokio::test]
async fn test_retry_policy_resubmits_erroring_record() {
    let harness = Harness::new(VisualErrorPolicy::Retry);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(finish(operator).await, 1);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A1", "A2"]);
    assert_eq!(
        report.outcomes,
        vec![CycleOutcome::Success, CycleOutcome::Success]
    );
}

#[tokio::test]
async fn test_error_still_visible_after_resume_pauses_again() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::ResumeKeepingError, Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(finish(operator).await, 2);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2"]);
    assert_eq!(report.status, RunStatus::Finished);
    assert_eq!(paused_count(&harness), 2);
    assert!(harness
        .observer
        .lines()
        .iter()
        .any(|l| l.contains("仍在屏幕上")));
}

fn paused_count(harness: &Harness) -> usize {
    harness
        .observer
        .statuses()
        .iter()
        .filter(|s| **s == RunStatus::Paused)
        .count()
}

#[tokio::test]
async fn test_focus_lost_after_resume_pauses_again() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::ClearLosingFocus, Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(finish(operator).await, 2);
    assert_eq!(paused_count(&harness), 2);
    // 重新暂停期间不会重复提交
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2"]);
    assert_eq!(
        report.outcomes,
        vec![CycleOutcome::ErrorHandled, CycleOutcome::Success]
    );
    assert_eq!(report.status, RunStatus::Finished);
    assert!(harness
        .observer
        .lines()
        .iter()
        .any(|l| l.contains("无法重新获取目标窗口焦点")));
}

#[tokio::test]
async fn test_error_reappearing_after_focus_pauses_again() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::ClearWithPopupOnFocus, Step::ClearAndResume]);

    let report = run(&harness, &["A1", "A2"]).await;

    assert_eq!(finish(operator).await, 2);
    assert_eq!(paused_count(&harness), 2);
    assert_eq!(harness.executor.attempts(), vec!["A1", "A2"]);
    assert_eq!(
        report.outcomes,
        vec![CycleOutcome::ErrorHandled, CycleOutcome::Success]
    );
    assert_eq!(report.status, RunStatus::Finished);
    assert!(harness
        .observer
        .lines()
        .iter()
        .any(|l| l.contains("再次出现")));
    assert!(!harness.screen.has_error());
}

#[tokio::test]
async fn test_cancel_while_running_stops_before_next_record() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::Cancel);

    let report = run(&harness, &["A1", "A2", "A3"]).await;

    assert_eq!(harness.executor.attempts(), vec!["A1"]);
    assert_eq!(report.outcomes, vec![CycleOutcome::Success]);
    assert_eq!(report.status, RunStatus::Stopped);
    assert_eq!(report.state, EngineState::Finished);
    assert!(!harness.observer.statuses().contains(&RunStatus::Paused));
    assert_eq!(harness.observer.statuses().last(), Some(&RunStatus::Stopped));
    assert!(!harness.coordinator.is_cancelled());
}

#[tokio::test]
async fn test_runner_can_run_again_after_cancel() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    harness.executor.on("A1", Effect::ShowError);
    let operator = harness.operator(vec![Step::Cancel]);
    let first = run(&harness, &["A1", "A2"]).await;
    finish(operator).await;
    assert_eq!(first.status, RunStatus::Stopped);

    harness.screen.clear();
    let second = run(&harness, &["B1"]).await;
    assert_eq!(second.status, RunStatus::Finished);
    assert_eq!(harness.executor.attempts(), vec!["A1", "B1"]);
}

/// 报告的总数比实际多一条的数据源
struct ShortSource(RecordSet);

impl RecordSource for ShortSource {
    fn count(&self) -> usize {
        self.0.count() + 1
    }

    fn record(&self, index: usize) -> Option<Record> {
        self.0.record(index)
    }
}

#[tokio::test]
async fn test_missing_record_is_fatal() {
    let harness = Harness::new(VisualErrorPolicy::Skip);
    let source = ShortSource(records(&["A1"]));

    let report = harness.runner.run(&source).await;

    assert_eq!(harness.executor.attempts(), vec!["A1"]);
    assert_eq!(report.outcomes, vec![CycleOutcome::Success, CycleOutcome::Fatal]);
    assert_eq!(report.state, EngineState::Failed);
    assert_eq!(report.status, RunStatus::Error);
    assert_eq!(harness.coordinator.current_index(), 0);
}
