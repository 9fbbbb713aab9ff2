use anyhow::{Context, Result};
use colored::Colorize;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::watch;

use crate::core::orchestrator::{
    FeedSnapshot, Orchestrator, OrchestratorHandle, OrchestratorRuntime, SysinfoMetricSource,
};
use crate::core::Config;
use crate::platform::{CommandNotifier, CommandThemeManager};
use crate::ui::format_snapshot_line;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let json = matches.get_flag("json");
    let start_disabled = matches.get_flag("disabled");

    let config = Config::load()?;
    let settings = config.orchestrator_settings();

    let (mut orchestrator, completion_rx) = Orchestrator::from_settings(
        &settings,
        Box::new(CommandThemeManager::new(&config.theme)),
        Box::new(CommandNotifier::new(&config.notifications)),
        Box::new(SysinfoMetricSource::new()),
    );
    if !start_disabled {
        orchestrator.initialize();
    }

    let runtime = OrchestratorRuntime::new(orchestrator, completion_rx);
    let handle = runtime.handle();

    // Setup Ctrl+C handler
    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "Shutting down...".yellow().bold());
        ctrlc_handle.shutdown();
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    spawn_stdin_control(handle.clone());

    if !json {
        println!("{}", "workpulse orchestrator running".bold().bright_cyan());
        println!(
            "{}",
            "Commands: enable | disable | recommend | feedback <action> <value> | quit".dimmed()
        );
        if start_disabled {
            println!("{}", "Started disabled; type 'enable' to begin".yellow());
        }
    }

    runtime
        .block_on(print_feed(handle.feed(), json))
        .context("Event loop failed")?;

    Ok(())
}

/// Print every published snapshot until the loop stops.
async fn print_feed(mut feed: watch::Receiver<Arc<FeedSnapshot>>, json: bool) {
    while feed.changed().await.is_ok() {
        let snapshot = feed.borrow_and_update().clone();
        if json {
            match serde_json::to_string(&*snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Failed to encode snapshot: {}", e),
            }
        } else {
            println!("{}", format_snapshot_line(&snapshot));
        }
    }
}

/// Line-based control on stdin; the reader thread ends with stdin.
fn spawn_stdin_control(handle: OrchestratorHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !apply_control_line(&handle, &line) {
                break;
            }
        }
    });
}

/// Returns false once the loop was asked to stop.
pub fn apply_control_line(handle: &OrchestratorHandle, line: &str) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("enable") => handle.set_enabled(true),
        Some("disable") => handle.set_enabled(false),
        Some("recommend") => handle.recommend_now(),
        Some("feedback") => match (words.next(), words.next()) {
            (Some(action), Some(value)) => handle.send_feedback(action, value),
            _ => eprintln!("{}", "usage: feedback <action> <value>".yellow()),
        },
        Some("quit") | Some("exit") => {
            handle.shutdown();
            return false;
        }
        Some(other) => eprintln!("{} {}", "Unknown command:".yellow(), other),
        None => {}
    }
    true
}
