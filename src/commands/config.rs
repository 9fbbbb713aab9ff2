use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::Config;

pub fn handle_config(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("path", _)) => {
            println!("{}", Config::path()?.display());
            Ok(())
        }
        Some(("reset", _)) => reset(),
        Some(("set", sub_matches)) => set(sub_matches),
        _ => {
            println!("Use 'workpulse config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = Config::load()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn reset() -> Result<()> {
    Config::default().save()?;
    println!("{}", "Configuration reset to defaults".green());
    Ok(())
}

fn set(matches: &clap::ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    println!("{} {} = {}", "✓".green(), key.bold(), value);

    if key == "policy.theme_cooldown_secs" || key == "schedule.recommendation_interval_secs" {
        let effective = config.dispatch_policy().theme_cooldown_secs;
        if effective != config.policy.theme_cooldown_secs {
            println!(
                "{}",
                format!(
                    "Note: theme cooldown is raised to two recommendation intervals ({}s)",
                    effective
                )
                .dimmed()
            );
        }
    }

    Ok(())
}
