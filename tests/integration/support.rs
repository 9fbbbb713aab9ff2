#![allow(dead_code)]

// Shared fixtures for the integration tests

use std::path::Path;
use tempfile::TempDir;
use workpulse::core::orchestrator::{
    DispatchPolicy, EngineConfig, Orchestrator, OrchestratorSettings, RecordingNotifier,
    RecordingThemeManager, StaticMetricSource,
};

pub const GAMING_THEME_DOC: &str = r#"{"theme_recommendation": {"theme": "dark-gaming", "workload": "gaming", "reason": "perf"}, "confidence_score": 0.9}"#;

/// Write a POSIX shell engine that answers each purpose with a canned response.
///
/// `recommend_body` is inserted verbatim as the `recommend)` branch.
pub fn write_engine(dir: &Path, recommend_body: &str) -> EngineConfig {
    let script = dir.join("engine.sh");
    let body = format!(
        "case \"$1\" in\n  collect) exit 0 ;;\n  feedback) echo \"Feedback recorded: $3 = $5\" ;;\n  recommend)\n{}\n  ;;\nesac\n",
        recommend_body
    );
    std::fs::write(&script, body).unwrap();

    EngineConfig {
        runtime: "sh".to_string(),
        script,
        timeout_secs: 10,
        recommendations_file: None,
    }
}

/// Engine whose `recommend` prints `document` on stdout
pub fn json_engine(dir: &Path, document: &str) -> EngineConfig {
    write_engine(dir, &format!("cat <<'DOC'\n{}\nDOC", document))
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub completions: tokio::sync::mpsc::UnboundedReceiver<workpulse::core::orchestrator::EngineCompletion>,
    pub themes: RecordingThemeManager,
    pub notifier: RecordingNotifier,
    pub metrics: StaticMetricSource,
    pub _dir: TempDir,
}

/// Orchestrator wired to recording collaborators and a fake engine.
pub fn harness(processes: &[&str], document: &str) -> Harness {
    let dir = TempDir::new().unwrap();
    let engine = json_engine(dir.path(), document);
    harness_with_engine(processes, engine, dir)
}

pub fn harness_with_engine(processes: &[&str], engine: EngineConfig, dir: TempDir) -> Harness {
    let themes = RecordingThemeManager::new();
    let notifier = RecordingNotifier::new();
    let metrics = StaticMetricSource::new(processes.iter().copied());

    let settings = OrchestratorSettings {
        engine,
        policy: DispatchPolicy::default(),
        ..Default::default()
    };

    let (orchestrator, completions) = Orchestrator::from_settings(
        &settings,
        Box::new(themes.clone()),
        Box::new(notifier.clone()),
        Box::new(metrics.clone()),
    );

    Harness {
        orchestrator,
        completions,
        themes,
        notifier,
        metrics,
        _dir: dir,
    }
}
