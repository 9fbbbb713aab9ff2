use anyhow::{bail, Context, Result};
use colored::Colorize;
use tokio::time::Instant;

use crate::core::orchestrator::{
    CompletionReport, Orchestrator, OrchestratorSettings, RecordingNotifier,
    RecordingThemeManager, StaticMetricSource,
};
use crate::core::Config;

const FEEDBACK_VALUES: [&str; 3] = ["positive", "negative", "neutral"];

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let action = matches
        .get_one::<String>("action")
        .context("Action argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    if !FEEDBACK_VALUES.contains(&value.as_str()) {
        bail!(
            "Invalid feedback value '{}' (expected one of: {})",
            value,
            FEEDBACK_VALUES.join(", ")
        );
    }

    let config = Config::load()?;
    let settings = config.orchestrator_settings();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(send(settings, action, value))
}

async fn send(settings: OrchestratorSettings, action: &str, value: &str) -> Result<()> {
    // Feedback never reaches the dispatcher; collaborators are placeholders
    let (mut orchestrator, mut completion_rx) = Orchestrator::from_settings(
        &settings,
        Box::new(RecordingThemeManager::new()),
        Box::new(RecordingNotifier::new()),
        Box::new(StaticMetricSource::default()),
    );
    orchestrator.initialize();
    orchestrator.send_feedback(action, value)?;

    let completion = completion_rx
        .recv()
        .await
        .context("Analysis engine channel closed")?;

    match orchestrator.handle_completion(completion, Instant::now()) {
        CompletionReport::FeedbackRecorded(_) => {
            println!(
                "{} {} → {}",
                "Feedback recorded:".green().bold(),
                action,
                value
            );
            Ok(())
        }
        CompletionReport::Failed(_, e) => bail!("Feedback failed: {}", e),
        other => bail!("Unexpected engine completion: {:?}", other),
    }
}
