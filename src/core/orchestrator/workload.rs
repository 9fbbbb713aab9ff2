//! Workload classification from running process names.
//!
//! Classification is an ordered list of keyword rules: the first rule whose
//! keyword set intersects the running processes wins. Rule order is the
//! priority order (gaming, development, media, productivity), and anything
//! that matches no rule falls through to `general` with a baseline confidence.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorkpulseError;

/// Coarse category of the user's current activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadLabel {
    #[default]
    General,
    Gaming,
    Development,
    Media,
    Productivity,
}

impl WorkloadLabel {
    pub const ALL: [WorkloadLabel; 5] = [
        WorkloadLabel::General,
        WorkloadLabel::Gaming,
        WorkloadLabel::Development,
        WorkloadLabel::Media,
        WorkloadLabel::Productivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadLabel::General => "general",
            WorkloadLabel::Gaming => "gaming",
            WorkloadLabel::Development => "development",
            WorkloadLabel::Media => "media",
            WorkloadLabel::Productivity => "productivity",
        }
    }
}

impl fmt::Display for WorkloadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadLabel {
    type Err = WorkpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        WorkloadLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| WorkpulseError::UnknownWorkload(s.to_string()))
    }
}

/// Outcome of one classification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: WorkloadLabel,
    /// Deterministic score of the matching rule, always in [0, 1]
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
    /// Process that triggered the rule, if any
    pub matched_process: Option<String>,
}

/// A single keyword rule.
///
/// A process name equal to a keyword (case-insensitive) scores `confidence`;
/// a process name that only starts with a keyword (`python3`, `steamwebhelper`)
/// scores `partial_confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub label: WorkloadLabel,
    pub keywords: Vec<String>,
    pub confidence: f64,
    pub partial_confidence: f64,
}

impl ClassifierRule {
    pub fn new<S: AsRef<str>>(
        label: WorkloadLabel,
        keywords: &[S],
        confidence: f64,
        partial_confidence: f64,
    ) -> Self {
        Self {
            label,
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            confidence: clamp_unit(confidence),
            partial_confidence: clamp_unit(partial_confidence),
        }
    }

    /// Returns the matched process and the score for it, exact matches first.
    fn evaluate<'a>(&self, names: &'a [String]) -> Option<(&'a str, f64)> {
        let exact = names
            .iter()
            .find(|name| self.keywords.iter().any(|k| *name == k));
        if let Some(name) = exact {
            return Some((name.as_str(), self.confidence));
        }

        names
            .iter()
            .find(|name| self.keywords.iter().any(|k| name.starts_with(k.as_str())))
            .map(|name| (name.as_str(), self.partial_confidence))
    }
}

static DEFAULT_RULES: Lazy<Vec<ClassifierRule>> = Lazy::new(|| {
    vec![
        ClassifierRule::new(
            WorkloadLabel::Gaming,
            &["steam", "lutris", "heroic", "wine", "proton", "gamescope"],
            0.9,
            0.7,
        ),
        ClassifierRule::new(
            WorkloadLabel::Development,
            &[
                "code", "nvim", "vim", "jetbrains", "cargo", "make", "gcc", "python",
            ],
            0.85,
            0.65,
        ),
        ClassifierRule::new(
            WorkloadLabel::Media,
            &["vlc", "mpv", "ffmpeg", "obs", "gimp", "inkscape", "blender"],
            0.8,
            0.6,
        ),
        ClassifierRule::new(
            WorkloadLabel::Productivity,
            &["firefox", "chrome", "thunderbird", "libreoffice", "discord"],
            0.75,
            0.55,
        ),
    ]
});

pub const DEFAULT_BASELINE_CONFIDENCE: f64 = 0.3;

/// Built-in rule list in priority order
pub fn default_rules() -> Vec<ClassifierRule> {
    DEFAULT_RULES.clone()
}

/// Classifier rules as stored in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub baseline_confidence: f64,
    /// Priority order: the first matching rule wins
    pub rules: Vec<ClassifierRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            baseline_confidence: DEFAULT_BASELINE_CONFIDENCE,
            rules: default_rules(),
        }
    }
}

/// Pure, ordered-rule workload classifier.
#[derive(Debug, Clone)]
pub struct WorkloadClassifier {
    rules: Vec<ClassifierRule>,
    baseline_confidence: f64,
}

impl WorkloadClassifier {
    pub fn new(rules: Vec<ClassifierRule>, baseline_confidence: f64) -> Self {
        // Re-normalize: rules loaded from config bypass ClassifierRule::new
        let rules = rules
            .into_iter()
            .map(|rule| {
                ClassifierRule::new(
                    rule.label,
                    &rule.keywords,
                    rule.confidence,
                    rule.partial_confidence,
                )
            })
            .collect();

        Self {
            rules,
            baseline_confidence: clamp_unit(baseline_confidence),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.rules.clone(), config.baseline_confidence)
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn baseline_confidence(&self) -> f64 {
        self.baseline_confidence
    }

    /// Classify a set of running process names.
    ///
    /// First matching rule wins; no match yields `general` at the baseline.
    pub fn classify<I, S>(&self, process_names: I) -> ClassificationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = process_names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        // Sets arrive in arbitrary order; sorting keeps `matched_process` stable
        names.sort();
        names.dedup();

        let observed_at = Utc::now();

        for rule in &self.rules {
            if let Some((process, confidence)) = rule.evaluate(&names) {
                return ClassificationResult {
                    label: rule.label,
                    confidence,
                    observed_at,
                    matched_process: Some(process.to_string()),
                };
            }
        }

        ClassificationResult {
            label: WorkloadLabel::General,
            confidence: self.baseline_confidence,
            observed_at,
            matched_process: None,
        }
    }
}

impl Default for WorkloadClassifier {
    fn default() -> Self {
        Self::new(default_rules(), DEFAULT_BASELINE_CONFIDENCE)
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
