#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use workpulse::core::orchestrator::{FeedSnapshot, OrchestratorRuntime, WorkloadLabel};

use super::support::{harness, GAMING_THEME_DOC};

/// Wait until a published snapshot satisfies `predicate`.
async fn wait_for<F>(feed: &mut watch::Receiver<Arc<FeedSnapshot>>, predicate: F) -> Arc<FeedSnapshot>
where
    F: Fn(&FeedSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = feed.borrow_and_update().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
            feed.changed().await.unwrap();
        }
    })
    .await
    .expect("feed never reached the expected state")
}

#[tokio::test]
async fn test_event_loop_runs_full_cycle() {
    let mut h = harness(&["steam"], GAMING_THEME_DOC);
    h.orchestrator.initialize();

    let runtime = OrchestratorRuntime::new(h.orchestrator, h.completions);
    let handle = runtime.handle();
    let mut feed = handle.feed();
    let task = tokio::spawn(runtime.run());

    let snapshot = wait_for(&mut feed, |s| s.last_applied_theme.is_some()).await;
    assert_eq!(snapshot.current_workload, WorkloadLabel::Gaming);
    assert_eq!(snapshot.last_applied_theme.as_deref(), Some("dark-gaming"));
    assert_eq!(h.themes.applied(), vec!["dark-gaming"]);

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_control_messages_toggle_enabled() {
    let h = harness(&["zsh"], "{}");

    let runtime = OrchestratorRuntime::new(h.orchestrator, h.completions);
    let handle = runtime.handle();
    let mut feed = handle.feed();
    assert!(!handle.snapshot().enabled);
    let task = tokio::spawn(runtime.run());

    handle.set_enabled(true);
    wait_for(&mut feed, |s| s.enabled).await;

    handle.set_enabled(false);
    wait_for(&mut feed, |s| !s.enabled).await;

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_recommend_now_runs_while_timer_is_idle() {
    let mut h = harness(&["steam"], GAMING_THEME_DOC);
    h.orchestrator.initialize();
    // Only an on-demand request can produce a recommendation
    h.orchestrator
        .scheduler_mut()
        .set_enabled(workpulse::core::orchestrator::TaskKind::RecommendationCycle, false);

    let runtime = OrchestratorRuntime::new(h.orchestrator, h.completions);
    let handle = runtime.handle();
    let mut feed = handle.feed();
    let task = tokio::spawn(runtime.run());

    handle.recommend_now();
    let snapshot = wait_for(&mut feed, |s| s.last_recommendation.is_some()).await;
    assert_eq!(snapshot.recent_recommendations.len(), 1);

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}
