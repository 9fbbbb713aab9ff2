use anyhow::{bail, Context, Result};
use colored::Colorize;
use tokio::time::Instant;

use crate::core::orchestrator::{
    CompletionReport, Decision, EnginePurpose, Notifier, Orchestrator, OrchestratorSettings,
    RecordingNotifier, RecordingThemeManager, SysinfoMetricSource, ThemeManager,
};
use crate::core::Config;
use crate::platform::{CommandNotifier, CommandThemeManager};
use crate::ui::{format_workload, print_decision, print_recommendation};

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let apply = matches.get_flag("apply");
    let collect_first = matches.get_flag("collect");

    let config = Config::load()?;
    let settings = config.orchestrator_settings();

    let (theme_manager, notifier): (Box<dyn ThemeManager>, Box<dyn Notifier>) = if apply {
        (
            Box::new(CommandThemeManager::new(&config.theme)),
            Box::new(CommandNotifier::new(&config.notifications)),
        )
    } else {
        (
            Box::new(RecordingThemeManager::new()),
            Box::new(RecordingNotifier::new()),
        )
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run_once(settings, theme_manager, notifier, collect_first, apply))
}

async fn run_once(
    settings: OrchestratorSettings,
    theme_manager: Box<dyn ThemeManager>,
    notifier: Box<dyn Notifier>,
    collect_first: bool,
    apply: bool,
) -> Result<()> {
    let (mut orchestrator, mut completion_rx) = Orchestrator::from_settings(
        &settings,
        theme_manager,
        notifier,
        Box::new(SysinfoMetricSource::new()),
    );
    orchestrator.initialize();
    orchestrator.refresh_metrics();
    let (classification, _) = orchestrator.detect_workload();
    println!("Current workload: {}", format_workload(classification.label));

    if collect_first {
        orchestrator.start_recommendation_cycle()?;
    } else {
        orchestrator.request_recommendations()?;
    }

    while let Some(completion) = completion_rx.recv().await {
        match orchestrator.handle_completion(completion, Instant::now()) {
            CompletionReport::Collected { .. } => {
                log::debug!("Collection finished, waiting for recommendations");
            }
            CompletionReport::Recommendations(_, decisions) => {
                print_report(&orchestrator, &decisions, apply);
                return Ok(());
            }
            CompletionReport::Failed(invocation, e)
                if invocation.purpose == EnginePurpose::Recommend =>
            {
                bail!("Recommendation request failed: {}", e);
            }
            other => log::debug!("Ignoring completion: {:?}", other),
        }
    }

    bail!("Analysis engine channel closed")
}

fn print_report(orchestrator: &Orchestrator, decisions: &[Decision], applied: bool) {
    let history = orchestrator.state().history();
    if history.is_empty() {
        println!("{}", "No recommendations".dimmed());
        return;
    }

    println!("\n{}", "RECOMMENDATIONS".bold().bright_cyan());
    println!("{}", "=".repeat(60));
    for rec in history.iter() {
        print_recommendation(rec);
    }

    println!("\n{}", "DECISIONS".bold().bright_cyan());
    println!("{}", "=".repeat(60));
    for decision in decisions {
        print_decision(decision);
    }

    if !applied {
        println!();
        println!(
            "{}",
            "DRY RUN - no side effects issued (use --apply)".yellow().bold()
        );
    }
}
