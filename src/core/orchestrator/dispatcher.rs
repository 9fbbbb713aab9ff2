//! Policy layer deciding which recommendations turn into side effects.
//!
//! Thresholds per kind:
//! - theme: applied only above the confidence threshold, and never re-applied
//!   inside the cooldown window
//! - performance / workload optimization: advisory, recorded only
//! - cleanup: notification for `high` priority only
//! - break: notification whenever `recommend_break` is set

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::recommendation::{Priority, Recommendation, RecommendationKind, RecommendationPayload};
use super::state::{OrchestratorState, DEFAULT_HISTORY_SIZE};

/// Applies a named theme. Fire-and-forget.
pub trait ThemeManager: Send {
    fn apply_theme(&self, name: &str);
}

/// Shows a desktop notification. Fire-and-forget.
pub trait Notifier: Send {
    fn notify(&self, title: &str, body: &str);
}

/// Dispatch thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicy {
    pub theme_confidence_threshold: f64,
    /// Minimum time before the same theme may be applied again
    pub theme_cooldown_secs: u64,
    pub history_size: usize,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            theme_confidence_threshold: 0.7,
            theme_cooldown_secs: 300,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl DispatchPolicy {
    pub fn theme_cooldown(&self) -> Duration {
        Duration::from_secs(self.theme_cooldown_secs)
    }
}

/// A request to an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffect {
    ApplyTheme { theme: String },
    Notify { title: String, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Side effects were issued
    Act,
    BelowThreshold { confidence: f64, threshold: f64 },
    /// Same theme applied too recently
    Cooldown { remaining: Duration },
    /// Recorded but not surfaced to the user
    NotSurfaced,
    /// Kept as telemetry, never auto-applied
    Advisory,
}

/// What the dispatcher did with one recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: RecommendationKind,
    pub verdict: Verdict,
    pub effects: Vec<SideEffect>,
}

impl Decision {
    fn act(kind: RecommendationKind, effects: Vec<SideEffect>) -> Self {
        Self {
            kind,
            verdict: Verdict::Act,
            effects,
        }
    }

    fn hold(kind: RecommendationKind, verdict: Verdict) -> Self {
        Self {
            kind,
            verdict,
            effects: Vec::new(),
        }
    }
}

pub struct Dispatcher {
    policy: DispatchPolicy,
    theme_manager: Box<dyn ThemeManager>,
    notifier: Box<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        policy: DispatchPolicy,
        theme_manager: Box<dyn ThemeManager>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            policy,
            theme_manager,
            notifier,
        }
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Decide without touching state or collaborators.
    pub fn decide(&self, rec: &Recommendation, state: &OrchestratorState, now: Instant) -> Decision {
        let kind = rec.kind();

        match &rec.payload {
            RecommendationPayload::Theme(theme) => {
                let threshold = self.policy.theme_confidence_threshold;
                if rec.confidence <= threshold {
                    return Decision::hold(
                        kind,
                        Verdict::BelowThreshold {
                            confidence: rec.confidence,
                            threshold,
                        },
                    );
                }

                if let Some(applied) = state.last_applied_theme() {
                    let elapsed = now.saturating_duration_since(applied.applied_instant);
                    let cooldown = self.policy.theme_cooldown();
                    if applied.name == theme.theme && elapsed < cooldown {
                        return Decision::hold(
                            kind,
                            Verdict::Cooldown {
                                remaining: cooldown - elapsed,
                            },
                        );
                    }
                }

                Decision::act(
                    kind,
                    vec![
                        SideEffect::ApplyTheme {
                            theme: theme.theme.clone(),
                        },
                        SideEffect::Notify {
                            title: "Theme changed".to_string(),
                            body: format!(
                                "Switched to {} for {} workload ({})",
                                theme.theme, theme.workload, theme.reason
                            ),
                        },
                    ],
                )
            }
            RecommendationPayload::Performance(_) => Decision::hold(kind, Verdict::Advisory),
            RecommendationPayload::WorkloadOptimization(_) => {
                Decision::hold(kind, Verdict::Advisory)
            }
            RecommendationPayload::Cleanup(cleanup) => {
                if cleanup.priority != Priority::High {
                    return Decision::hold(kind, Verdict::NotSurfaced);
                }

                let body = if cleanup.actions.is_empty() {
                    "System cleanup recommended".to_string()
                } else {
                    cleanup.actions.join("; ")
                };

                Decision::act(
                    kind,
                    vec![SideEffect::Notify {
                        title: "Cleanup recommended".to_string(),
                        body,
                    }],
                )
            }
            RecommendationPayload::Break(brk) => {
                if !brk.recommend_break {
                    return Decision::hold(kind, Verdict::NotSurfaced);
                }

                let hours = brk.session_duration.unwrap_or_default();
                let mut body = format!("You've been active for {} hours.", hours);
                if let Some(break_type) = &brk.break_type {
                    body.push_str(&format!(" Time for a {} break.", break_type));
                }

                Decision::act(
                    kind,
                    vec![SideEffect::Notify {
                        title: "Time for a break".to_string(),
                        body,
                    }],
                )
            }
        }
    }

    /// Record the recommendation, decide, and issue the resulting side effects.
    pub fn apply(&self, rec: &Recommendation, state: &mut OrchestratorState, now: Instant) -> Decision {
        state.record_recommendation(rec);

        let decision = self.decide(rec, state, now);
        match &decision.verdict {
            Verdict::Act => log::info!("Acting on {} recommendation", decision.kind),
            Verdict::BelowThreshold {
                confidence,
                threshold,
            } => log::info!(
                "Holding {} recommendation: confidence {:.2} not above {:.2}",
                decision.kind,
                confidence,
                threshold
            ),
            Verdict::Cooldown { remaining } => log::debug!(
                "Holding {} recommendation: cooldown has {}s left",
                decision.kind,
                remaining.as_secs()
            ),
            Verdict::NotSurfaced => log::debug!("Recorded {} recommendation", decision.kind),
            Verdict::Advisory => log::info!("Advisory {} recommendation: {:?}", decision.kind, rec.payload),
        }

        for effect in &decision.effects {
            match effect {
                SideEffect::ApplyTheme { theme } => {
                    self.theme_manager.apply_theme(theme);
                    state.record_theme_applied(theme, now);
                }
                SideEffect::Notify { title, body } => self.notifier.notify(title, body),
            }
        }

        decision
    }
}

/// Theme manager that only records requests
#[derive(Debug, Clone, Default)]
pub struct RecordingThemeManager {
    applied: Arc<Mutex<Vec<String>>>,
}

impl RecordingThemeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().clone()
    }
}

impl ThemeManager for RecordingThemeManager {
    fn apply_theme(&self, name: &str) {
        self.applied.lock().push(name.to_string());
    }
}

/// Notifier that only records notifications
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent.lock().push((title.to_string(), body.to_string()));
    }
}
