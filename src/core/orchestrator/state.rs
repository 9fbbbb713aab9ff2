//! Orchestrator state and the snapshot published to feed consumers.
//!
//! Write ownership is split by field: the classifier path writes the workload
//! fields, the dispatcher path writes the recommendation and theme fields.
//! The state is owned by the event loop and passed by reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::time::Instant;

use super::metrics::ResourceUsage;
use super::recommendation::Recommendation;
use super::workload::{ClassificationResult, WorkloadLabel};

pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Bounded buffer of recently received recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationHistory {
    capacity: usize,
    entries: VecDeque<Recommendation>,
}

impl RecommendationHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, recommendation: Recommendation) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(recommendation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.entries.iter()
    }
}

impl Default for RecommendationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// The last theme the dispatcher actually applied
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTheme {
    pub name: String,
    pub applied_at: DateTime<Utc>,
    /// Monotonic timestamp used for the cooldown window
    pub applied_instant: Instant,
}

/// Emitted when a classification changes the current workload label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadChange {
    pub previous: WorkloadLabel,
    pub current: WorkloadLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorState {
    enabled: bool,
    current_workload: WorkloadLabel,
    confidence: f64,
    classified_at: Option<DateTime<Utc>>,
    last_recommendation: Option<Recommendation>,
    last_applied_theme: Option<AppliedTheme>,
    history: RecommendationHistory,
    resources: Option<ResourceUsage>,
}

impl OrchestratorState {
    /// Fresh state: `general`, confidence 0, disabled until initialized
    pub fn new() -> Self {
        Self::with_history_size(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(history_size: usize) -> Self {
        Self {
            enabled: false,
            current_workload: WorkloadLabel::General,
            confidence: 0.0,
            classified_at: None,
            last_recommendation: None,
            last_applied_theme: None,
            history: RecommendationHistory::with_capacity(history_size),
            resources: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn current_workload(&self) -> WorkloadLabel {
        self.current_workload
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn classified_at(&self) -> Option<DateTime<Utc>> {
        self.classified_at
    }

    pub fn last_recommendation(&self) -> Option<&Recommendation> {
        self.last_recommendation.as_ref()
    }

    pub fn last_applied_theme(&self) -> Option<&AppliedTheme> {
        self.last_applied_theme.as_ref()
    }

    pub fn history(&self) -> &RecommendationHistory {
        &self.history
    }

    pub fn resources(&self) -> Option<&ResourceUsage> {
        self.resources.as_ref()
    }

    /// Classifier write path. Returns a change only when the label differs.
    pub fn record_classification(&mut self, result: &ClassificationResult) -> Option<WorkloadChange> {
        let previous = self.current_workload;
        self.current_workload = result.label;
        self.confidence = result.confidence;
        self.classified_at = Some(result.observed_at);

        (previous != result.label).then_some(WorkloadChange {
            previous,
            current: result.label,
            confidence: result.confidence,
        })
    }

    /// Metric refresh write path
    pub fn record_resources(&mut self, usage: ResourceUsage) {
        self.resources = Some(usage);
    }

    /// Dispatcher write path: every received recommendation lands here
    pub fn record_recommendation(&mut self, recommendation: &Recommendation) {
        self.history.push(recommendation.clone());
        self.last_recommendation = Some(recommendation.clone());
    }

    /// Dispatcher write path: a theme change was issued
    pub fn record_theme_applied(&mut self, name: &str, at: Instant) {
        self.last_applied_theme = Some(AppliedTheme {
            name: name.to_string(),
            applied_at: Utc::now(),
            applied_instant: at,
        });
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            enabled: self.enabled,
            current_workload: self.current_workload,
            confidence: self.confidence,
            classified_at: self.classified_at,
            last_recommendation: self.last_recommendation.clone(),
            last_applied_theme: self.last_applied_theme.as_ref().map(|t| t.name.clone()),
            last_theme_change: self.last_applied_theme.as_ref().map(|t| t.applied_at),
            recent_recommendations: self.history.iter().cloned().collect(),
            resources: self.resources.clone(),
        }
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest-value view of the state for UI and log consumers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub enabled: bool,
    pub current_workload: WorkloadLabel,
    pub confidence: f64,
    pub classified_at: Option<DateTime<Utc>>,
    pub last_recommendation: Option<Recommendation>,
    pub last_applied_theme: Option<String>,
    pub last_theme_change: Option<DateTime<Utc>>,
    pub recent_recommendations: Vec<Recommendation>,
    pub resources: Option<ResourceUsage>,
}
