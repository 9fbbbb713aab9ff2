#![cfg(unix)]

use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;
use workpulse::core::orchestrator::{
    CompletionReport, EnginePurpose, TaskKind, Verdict, WorkloadLabel,
};

use super::support::{harness, harness_with_engine, write_engine, GAMING_THEME_DOC};

#[tokio::test]
async fn test_steam_session_applies_gaming_theme_once() {
    let mut h = harness(&["steam", "zsh"], GAMING_THEME_DOC);
    h.orchestrator.initialize();

    let now = Instant::now();
    let report = h.orchestrator.tick(now);
    assert_eq!(
        report.ran,
        vec![
            TaskKind::MetricsRefresh,
            TaskKind::WorkloadDetection,
            TaskKind::RecommendationCycle,
        ]
    );
    let classification = report.classification.unwrap();
    assert_eq!(classification.label, WorkloadLabel::Gaming);
    assert!(classification.confidence >= 0.8);
    assert_eq!(report.launched.len(), 1);

    // collect completes and chains recommend
    let completion = h.completions.recv().await.unwrap();
    match h.orchestrator.handle_completion(completion, now) {
        CompletionReport::Collected {
            recommend_request, ..
        } => assert!(recommend_request.is_some()),
        other => panic!("unexpected report {:?}", other),
    }

    let completion = h.completions.recv().await.unwrap();
    match h.orchestrator.handle_completion(completion, now) {
        CompletionReport::Recommendations(_, decisions) => {
            assert_eq!(decisions.len(), 1);
            assert_eq!(decisions[0].verdict, Verdict::Act);
        }
        other => panic!("unexpected report {:?}", other),
    }

    assert_eq!(h.themes.applied(), vec!["dark-gaming"]);
    assert_eq!(h.orchestrator.state().current_workload(), WorkloadLabel::Gaming);
    assert_eq!(h.notifier.sent().len(), 1);

    // The same recommendation on the next cycle stays inside the cooldown
    h.orchestrator.request_recommendations().unwrap();
    let completion = h.completions.recv().await.unwrap();
    h.orchestrator
        .handle_completion(completion, now + Duration::from_secs(60));

    assert_eq!(h.themes.applied(), vec!["dark-gaming"]);
}

#[tokio::test]
async fn test_workload_change_does_not_double_launch() {
    let mut h = harness(&["steam"], "{}");
    h.orchestrator.initialize();

    let start = Instant::now();
    h.orchestrator.tick(start);

    // Nothing but metrics is due one second later
    let report = h.orchestrator.tick(start + Duration::from_secs(1));
    assert_eq!(report.ran, vec![TaskKind::MetricsRefresh]);
    assert!(report.launched.is_empty());
}

#[tokio::test]
async fn test_workload_change_expedites_recommendation_cycle() {
    let mut h = harness(&["zsh"], "{}");
    h.orchestrator.initialize();

    let start = Instant::now();
    h.orchestrator.tick(start);
    assert_eq!(h.orchestrator.state().current_workload(), WorkloadLabel::General);

    // Finish the first cycle so the collect slot is free
    let completion = h.completions.recv().await.unwrap();
    h.orchestrator.handle_completion(completion, start);
    let completion = h.completions.recv().await.unwrap();
    h.orchestrator.handle_completion(completion, start);

    h.metrics.set_processes(["nvim"]);
    let report = h.orchestrator.tick(start + Duration::from_secs(30));
    assert_eq!(report.workload_change.map(|c| c.current), Some(WorkloadLabel::Development));

    let next = h.orchestrator.tick(start + Duration::from_secs(31));
    assert!(next.ran.contains(&TaskKind::RecommendationCycle));
    assert_eq!(next.launched.len(), 1);
}

#[tokio::test]
async fn test_results_after_disable_are_discarded() {
    let mut h = harness(&["steam"], GAMING_THEME_DOC);
    h.orchestrator.initialize();

    h.orchestrator.request_recommendations().unwrap();
    h.orchestrator.set_enabled(false);
    let before = h.orchestrator.state().clone();

    let completion = h.completions.recv().await.unwrap();
    let report = h.orchestrator.handle_completion(completion, Instant::now());

    assert!(matches!(report, CompletionReport::Discarded(_)));
    assert_eq!(h.orchestrator.state(), &before);
    assert!(h.themes.applied().is_empty());
    assert!(!h.orchestrator.client().is_pending(EnginePurpose::Recommend));
}

#[test]
fn test_disabled_orchestrator_does_not_tick() {
    let mut h = harness(&["steam"], "{}");

    let report = h.orchestrator.tick(Instant::now());

    assert!(report.is_idle());
    assert_eq!(h.metrics.refresh_count(), 0);
    assert_eq!(h.orchestrator.state().current_workload(), WorkloadLabel::General);
}

#[tokio::test]
async fn test_engine_failure_leaves_state_unchanged() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "exit 1");
    let mut h = harness_with_engine(&["steam"], engine, dir);
    h.orchestrator.initialize();

    h.orchestrator.request_recommendations().unwrap();
    let before = h.orchestrator.state().clone();
    let completion = h.completions.recv().await.unwrap();
    let report = h.orchestrator.handle_completion(completion, Instant::now());

    match report {
        CompletionReport::Failed(invocation, err) => {
            assert_eq!(invocation.purpose, EnginePurpose::Recommend);
            assert!(err.is_transient());
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(h.orchestrator.state(), &before);

    // Next request is accepted
    assert!(h.orchestrator.request_recommendations().is_ok());
}

#[tokio::test]
async fn test_malformed_output_is_dropped() {
    let mut h = harness(&["steam"], r#"{"theme_recommendation": {"theme": "x"}}"#);
    h.orchestrator.initialize();

    h.orchestrator.request_recommendations().unwrap();
    let completion = h.completions.recv().await.unwrap();
    let report = h.orchestrator.handle_completion(completion, Instant::now());

    assert!(matches!(report, CompletionReport::Failed(..)));
    assert!(h.orchestrator.state().last_recommendation().is_none());
}

#[tokio::test]
async fn test_feedback_is_not_parsed() {
    let mut h = harness(&["steam"], GAMING_THEME_DOC);
    h.orchestrator.initialize();

    h.orchestrator.send_feedback("theme_change", "positive").unwrap();
    let completion = h.completions.recv().await.unwrap();
    let report = h.orchestrator.handle_completion(completion, Instant::now());

    assert!(matches!(report, CompletionReport::FeedbackRecorded(_)));
    assert!(h.orchestrator.state().last_recommendation().is_none());
}
