use anyhow::Result;
use clap::{Arg, Command};

use workpulse::commands;

fn main() -> Result<()> {
    let matches = Command::new("workpulse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Adaptive workload classification and recommendation orchestrator")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about("Run the orchestrator until Ctrl+C")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print every feed snapshot as a JSON line")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("disabled")
                        .long("disabled")
                        .help("Start disabled; type 'enable' on stdin to begin")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify the current workload once")
                .arg(
                    Arg::new("processes")
                        .short('p')
                        .long("processes")
                        .value_name("NAMES")
                        .help("Comma-separated process names to classify instead of live processes"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the classification as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("recommend")
                .about("Ask the analysis engine for recommendations and show what would be done")
                .arg(
                    Arg::new("apply")
                        .long("apply")
                        .help("Actually apply themes and send notifications")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("collect")
                        .long("collect")
                        .help("Run a data collection first")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("feedback")
                .about("Send feedback about an action to the analysis engine")
                .arg(
                    Arg::new("action")
                        .help("Action the feedback is about (e.g. theme_change)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("value")
                        .help("positive, negative or neutral")
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage configuration (use 'workpulse config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the current configuration"))
                .subcommand(Command::new("path").about("Print the configuration file path"))
                .subcommand(Command::new("reset").about("Restore default configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Set a value by dotted key (e.g. policy.theme_cooldown_secs 600)")
                        .arg(
                            Arg::new("key")
                                .help("Dotted configuration key")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value (JSON or plain string)")
                                .required(true)
                                .index(2),
                        ),
                ),
        )
        .get_matches();

    workpulse::init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches)?,
        Some(("classify", sub_matches)) => commands::classify(sub_matches)?,
        Some(("recommend", sub_matches)) => commands::recommend(sub_matches)?,
        Some(("feedback", sub_matches)) => commands::feedback(sub_matches)?,
        Some(("config", sub_matches)) => commands::config(sub_matches)?,
        _ => {
            println!("Welcome to workpulse!");
            println!("Use 'workpulse --help' for more information.");
        }
    }

    Ok(())
}
