#![cfg(unix)]

use std::time::Duration;
use tempfile::TempDir;
use workpulse::core::orchestrator::{
    parse_engine_output, resolve_document, run_engine, EngineArgs, EngineCommand, EngineOutcome,
    EnginePurpose, RecommendationClient,
};
use workpulse::WorkpulseError;

use super::support::{json_engine, write_engine, GAMING_THEME_DOC};

#[tokio::test]
async fn test_recommend_stdout_is_delivered() {
    let dir = TempDir::new().unwrap();
    let (mut client, mut rx) = RecommendationClient::with_channel(json_engine(dir.path(), GAMING_THEME_DOC));

    let id = client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    assert!(client.is_pending(EnginePurpose::Recommend));

    let completion = rx.recv().await.unwrap();
    assert_eq!(completion.request_id, id);
    assert_eq!(completion.purpose, EnginePurpose::Recommend);

    let invocation = client.complete(&completion).unwrap();
    assert_eq!(invocation.request_id, id);
    assert!(!client.is_pending(EnginePurpose::Recommend));

    let stdout = completion.outcome.into_result(EnginePurpose::Recommend).unwrap();
    let recs = parse_engine_output(&stdout).unwrap();
    assert_eq!(recs.len(), 1);
}

#[tokio::test]
async fn test_pending_purpose_rejects_second_request() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "sleep 1\necho '{}'");
    let (mut client, mut rx) = RecommendationClient::with_channel(engine);

    client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    let err = client
        .invoke(EnginePurpose::Recommend, &EngineArgs::new())
        .unwrap_err();
    assert!(matches!(
        err,
        WorkpulseError::InvocationPending(EnginePurpose::Recommend)
    ));

    let completion = rx.recv().await.unwrap();
    assert!(client.complete(&completion).is_some());

    // Exactly one result for the accepted request
    let extra = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_other_purposes_run_concurrently() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "sleep 1\necho '{}'");
    let (mut client, mut rx) = RecommendationClient::with_channel(engine);

    client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    client.invoke(EnginePurpose::Collect, &EngineArgs::new()).unwrap();
    client
        .invoke(EnginePurpose::Feedback, &EngineArgs::feedback("theme_change", "positive"))
        .unwrap();
    assert_eq!(client.pending().count(), 3);

    for _ in 0..3 {
        let completion = rx.recv().await.unwrap();
        assert!(client.complete(&completion).is_some());
    }
    assert_eq!(client.pending().count(), 0);
}

#[tokio::test]
async fn test_stale_completion_is_ignored() {
    let dir = TempDir::new().unwrap();
    let (mut client, mut rx) = RecommendationClient::with_channel(json_engine(dir.path(), "{}"));

    client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    let mut completion = rx.recv().await.unwrap();
    completion.request_id += 100;

    assert!(client.complete(&completion).is_none());
    assert!(client.is_pending(EnginePurpose::Recommend));
}

#[tokio::test]
async fn test_nonzero_exit_is_failure() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "echo 'model missing' >&2\nexit 3");
    let command = EngineCommand::build(&engine, EnginePurpose::Recommend, &EngineArgs::new());

    match run_engine(&command, Duration::from_secs(5)).await {
        EngineOutcome::Failed { code, stderr } => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("model missing"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_engine_times_out() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "sleep 5");
    let command = EngineCommand::build(&engine, EnginePurpose::Recommend, &EngineArgs::new());

    let outcome = run_engine(&command, Duration::from_millis(200)).await;
    assert_eq!(outcome, EngineOutcome::TimedOut(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_missing_runtime_is_spawn_failure() {
    let dir = TempDir::new().unwrap();
    let mut engine = json_engine(dir.path(), "{}");
    engine.runtime = "workpulse-no-such-interpreter".to_string();
    let command = EngineCommand::build(&engine, EnginePurpose::Collect, &EngineArgs::new());

    let outcome = run_engine(&command, Duration::from_secs(5)).await;
    assert!(matches!(outcome, EngineOutcome::SpawnFailed(_)));
}

#[tokio::test]
async fn test_feedback_flags_reach_engine() {
    let dir = TempDir::new().unwrap();
    let engine = write_engine(dir.path(), "exit 0");
    let command = EngineCommand::build(
        &engine,
        EnginePurpose::Feedback,
        &EngineArgs::feedback("theme_change", "negative"),
    );

    match run_engine(&command, Duration::from_secs(5)).await {
        EngineOutcome::Succeeded { stdout } => {
            assert_eq!(stdout.trim(), "Feedback recorded: theme_change = negative");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_text_stdout_falls_back_to_recommendations_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("recommendations.json");
    std::fs::write(&file, GAMING_THEME_DOC).unwrap();

    let document = resolve_document(
        EnginePurpose::Recommend,
        "🤖 AI Recommendations:\n🎨 Theme: dark-gaming\n".to_string(),
        Some(file.as_path()),
    )
    .await;
    assert_eq!(parse_engine_output(&document).unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_stdout_ignores_stale_recommendations_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("recommendations.json");
    std::fs::write(&file, GAMING_THEME_DOC).unwrap();

    let document =
        resolve_document(EnginePurpose::Recommend, "  \n".to_string(), Some(file.as_path())).await;
    assert!(document.is_empty());
    assert!(parse_engine_output(&document).unwrap().is_empty());
}

#[tokio::test]
async fn test_invoke_resolves_text_output_through_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("recommendations.json");
    std::fs::write(&file, GAMING_THEME_DOC).unwrap();

    let mut engine = write_engine(dir.path(), "echo 'Theme: dark-gaming'");
    engine.recommendations_file = Some(file);
    let (mut client, mut rx) = RecommendationClient::with_channel(engine);

    client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    let completion = rx.recv().await.unwrap();
    client.complete(&completion).unwrap();

    let stdout = completion.outcome.into_result(EnginePurpose::Recommend).unwrap();
    assert_eq!(parse_engine_output(&stdout).unwrap().len(), 1);
}

#[tokio::test]
async fn test_invoke_with_empty_output_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("recommendations.json");
    std::fs::write(&file, GAMING_THEME_DOC).unwrap();

    let mut engine = write_engine(dir.path(), "exit 0");
    engine.recommendations_file = Some(file);
    let (mut client, mut rx) = RecommendationClient::with_channel(engine);

    client.invoke(EnginePurpose::Recommend, &EngineArgs::new()).unwrap();
    let completion = rx.recv().await.unwrap();
    client.complete(&completion).unwrap();

    let stdout = completion.outcome.into_result(EnginePurpose::Recommend).unwrap();
    assert!(parse_engine_output(&stdout).unwrap().is_empty());
}
