use chrono::{DateTime, Local, Utc};
use colored::*;
use humansize::{format_size, BINARY};

use crate::core::orchestrator::{
    ClassificationResult, Decision, FeedSnapshot, Priority, Recommendation,
    RecommendationPayload, ResourceUsage, SideEffect, Verdict, WorkloadLabel,
};

/// Workload label colored by category
pub fn format_workload(label: WorkloadLabel) -> ColoredString {
    match label {
        WorkloadLabel::Gaming => label.as_str().bright_magenta().bold(),
        WorkloadLabel::Development => label.as_str().bright_cyan().bold(),
        WorkloadLabel::Media => label.as_str().bright_yellow().bold(),
        WorkloadLabel::Productivity => label.as_str().bright_green().bold(),
        WorkloadLabel::General => label.as_str().white().bold(),
    }
}

/// Confidence as a percentage, green above 70%, yellow above 40%
pub fn format_confidence(confidence: f64) -> ColoredString {
    let text = format!("{:.0}%", confidence * 100.0);
    if confidence > 0.7 {
        text.green()
    } else if confidence > 0.4 {
        text.yellow()
    } else {
        text.red()
    }
}

pub fn format_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red().bold(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".dimmed(),
    }
}

/// Format timestamp in local time (YYYY-MM-DD HH:MM:SS)
pub fn format_time(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_resources(usage: &ResourceUsage) -> String {
    format!(
        "CPU {:.1}% | RAM {:.1}% ({} / {}) | {} processes",
        usage.cpu_percent,
        usage.memory_percent,
        format_size(usage.memory_used_bytes, BINARY),
        format_size(usage.memory_total_bytes, BINARY),
        usage.process_count
    )
}

pub fn print_classification(result: &ClassificationResult) {
    println!("\n{}", "WORKLOAD".bold().bright_cyan());
    println!("{}", "=".repeat(40));
    println!("  Workload:   {}", format_workload(result.label));
    println!("  Confidence: {}", format_confidence(result.confidence));
    match &result.matched_process {
        Some(process) => println!("  Matched:    {}", process),
        None => println!("  Matched:    {}", "no rule matched".dimmed()),
    }
    println!("  Observed:   {}", format_time(result.observed_at));
}

/// One-line summary of a recommendation's payload
pub fn describe_recommendation(rec: &Recommendation) -> String {
    match &rec.payload {
        RecommendationPayload::Theme(theme) => format!(
            "switch to '{}' for {} ({})",
            theme.theme, theme.workload, theme.reason
        ),
        RecommendationPayload::Performance(perf) => format!(
            "governor={} io={} swappiness={} ({})",
            perf.cpu_governor, perf.io_scheduler, perf.swappiness, perf.reason
        ),
        RecommendationPayload::Cleanup(cleanup) => {
            if cleanup.actions.is_empty() {
                format!("{} priority, no actions", cleanup.priority)
            } else {
                format!("{} priority: {}", cleanup.priority, cleanup.actions.join("; "))
            }
        }
        RecommendationPayload::Break(brk) => match (brk.recommend_break, brk.session_duration) {
            (true, Some(hours)) => format!("break recommended after {:.1} hours", hours),
            (true, None) => "break recommended".to_string(),
            (false, _) => "no break needed".to_string(),
        },
        RecommendationPayload::WorkloadOptimization(opt) => {
            format!("{} priority: {}", opt.priority, opt.suggestions.join("; "))
        }
    }
}

pub fn print_recommendation(rec: &Recommendation) {
    let priority = match &rec.payload {
        RecommendationPayload::Cleanup(c) => Some(c.priority),
        RecommendationPayload::WorkloadOptimization(o) => Some(o.priority),
        _ => None,
    };

    print!(
        "  {:<22} {:>5}  ",
        rec.kind().as_str().bold(),
        format_confidence(rec.confidence)
    );
    if let Some(priority) = priority {
        print!("[{}] ", format_priority(priority));
    }
    println!("{}", describe_recommendation(rec));
}

pub fn format_verdict(verdict: &Verdict) -> ColoredString {
    match verdict {
        Verdict::Act => "acted".green().bold(),
        Verdict::BelowThreshold {
            confidence,
            threshold,
        } => format!("skipped: confidence {:.2} <= {:.2}", confidence, threshold).yellow(),
        Verdict::Cooldown { remaining } => {
            format!("skipped: cooldown ({}s left)", remaining.as_secs()).yellow()
        }
        Verdict::NotSurfaced => "recorded".dimmed(),
        Verdict::Advisory => "advisory".cyan(),
    }
}

pub fn print_decision(decision: &Decision) {
    println!(
        "  {:<22} {}",
        decision.kind.as_str().bold(),
        format_verdict(&decision.verdict)
    );
    for effect in &decision.effects {
        match effect {
            SideEffect::ApplyTheme { theme } => {
                println!("    {} apply theme {}", "→".dimmed(), theme.bright_white())
            }
            SideEffect::Notify { title, body } => {
                println!("    {} notify \"{}\": {}", "→".dimmed(), title, body)
            }
        }
    }
}

/// Single-line status for the live feed
pub fn format_snapshot_line(snapshot: &FeedSnapshot) -> String {
    let status = if snapshot.enabled {
        "on".green()
    } else {
        "off".red()
    };

    let mut line = format!(
        "[{}] {} {}",
        status,
        format_workload(snapshot.current_workload),
        format_confidence(snapshot.confidence)
    );

    if let Some(theme) = &snapshot.last_applied_theme {
        line.push_str(&format!(" | theme {}", theme));
    }
    if let Some(rec) = &snapshot.last_recommendation {
        line.push_str(&format!(" | last {}", rec.kind()));
    }
    if let Some(usage) = &snapshot.resources {
        line.push_str(&format!(" | {}", format_resources(usage).dimmed()));
    }

    line
}
