//! Typed recommendations decoded from the analysis engine's JSON document.
//!
//! The document is versioned by key presence: each recognized top-level key
//! yields one recommendation, unknown keys are ignored. Fields a kind requires
//! must be present; a missing field rejects the whole document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::workload::{clamp_unit, WorkloadLabel};
use crate::error::{Result, WorkpulseError};

/// Top-level key carrying a confidence shared by every recommendation in the document
pub const CONFIDENCE_KEY: &str = "confidence_score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Theme,
    Performance,
    Cleanup,
    Break,
    WorkloadOptimization,
}

impl RecommendationKind {
    /// Decode order; also the order recommendations are dispatched in
    pub const ALL: [RecommendationKind; 5] = [
        RecommendationKind::Theme,
        RecommendationKind::Performance,
        RecommendationKind::Cleanup,
        RecommendationKind::Break,
        RecommendationKind::WorkloadOptimization,
    ];

    /// Top-level document key for this kind
    pub fn key(&self) -> &'static str {
        match self {
            RecommendationKind::Theme => "theme_recommendation",
            RecommendationKind::Performance => "performance_recommendation",
            RecommendationKind::Cleanup => "cleanup_recommendation",
            RecommendationKind::Break => "break_recommendation",
            RecommendationKind::WorkloadOptimization => "workload_optimization",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Theme => "theme",
            RecommendationKind::Performance => "performance",
            RecommendationKind::Cleanup => "cleanup",
            RecommendationKind::Break => "break",
            RecommendationKind::WorkloadOptimization => "workload optimization",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = WorkpulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(WorkpulseError::malformed(format!("unknown priority '{}'", other))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeRecommendation {
    pub theme: String,
    pub workload: WorkloadLabel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecommendation {
    pub cpu_governor: String,
    pub io_scheduler: String,
    pub swappiness: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupRecommendation {
    pub priority: Priority,
    pub actions: Vec<String>,
    pub disk_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRecommendation {
    pub recommend_break: bool,
    /// Hours of continuous activity; required when a break is recommended
    pub session_duration: Option<f64>,
    pub break_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadOptimization {
    pub suggestions: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationPayload {
    Theme(ThemeRecommendation),
    Performance(PerformanceRecommendation),
    Cleanup(CleanupRecommendation),
    Break(BreakRecommendation),
    WorkloadOptimization(WorkloadOptimization),
}

/// One engine suggestion with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub payload: RecommendationPayload,
    pub confidence: f64,
    pub received_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(payload: RecommendationPayload, confidence: f64) -> Self {
        Self {
            payload,
            confidence: clamp_unit(confidence),
            received_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> RecommendationKind {
        match self.payload {
            RecommendationPayload::Theme(_) => RecommendationKind::Theme,
            RecommendationPayload::Performance(_) => RecommendationKind::Performance,
            RecommendationPayload::Cleanup(_) => RecommendationKind::Cleanup,
            RecommendationPayload::Break(_) => RecommendationKind::Break,
            RecommendationPayload::WorkloadOptimization(_) => {
                RecommendationKind::WorkloadOptimization
            }
        }
    }
}

/// Parse raw engine stdout. Empty output is a valid "nothing to recommend".
pub fn parse_engine_output(output: &str) -> Result<Vec<Recommendation>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_json::from_str(trimmed)?;
    let object = document
        .as_object()
        .ok_or_else(|| WorkpulseError::malformed("expected a JSON object at top level"))?;

    decode_document(object)
}

/// Decode every recognized top-level key into a recommendation.
pub fn decode_document(document: &Map<String, Value>) -> Result<Vec<Recommendation>> {
    let shared_confidence = optional_f64(document, CONFIDENCE_KEY, "document")?;

    let mut recommendations = Vec::new();
    for kind in RecommendationKind::ALL {
        let Some(value) = document.get(kind.key()) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let object = value.as_object().ok_or_else(|| {
            WorkpulseError::malformed(format!("'{}' must be an object", kind.key()))
        })?;

        let payload = decode_payload(kind, object)?;
        let own_confidence = optional_f64(object, "confidence", kind.as_str())?;
        let confidence = own_confidence.or(shared_confidence).unwrap_or(0.0);

        recommendations.push(Recommendation::new(payload, confidence));
    }

    Ok(recommendations)
}

fn decode_payload(kind: RecommendationKind, obj: &Map<String, Value>) -> Result<RecommendationPayload> {
    let name = kind.as_str();
    let payload = match kind {
        RecommendationKind::Theme => RecommendationPayload::Theme(ThemeRecommendation {
            theme: required_str(obj, name, "theme")?,
            workload: required_str(obj, name, "workload")?.parse()?,
            reason: required_str(obj, name, "reason")?,
        }),
        RecommendationKind::Performance => {
            let swappiness = required(obj, name, "swappiness")?
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| WorkpulseError::malformed("swappiness must be a non-negative integer"))?;

            RecommendationPayload::Performance(PerformanceRecommendation {
                cpu_governor: required_str(obj, name, "cpu_governor")?,
                io_scheduler: required_str(obj, name, "io_scheduler")?,
                swappiness,
                reason: required_str(obj, name, "reason")?,
            })
        }
        RecommendationKind::Cleanup => RecommendationPayload::Cleanup(CleanupRecommendation {
            priority: required_str(obj, name, "priority")?.parse()?,
            actions: required_str_list(obj, name, "actions")?,
            disk_usage: optional_f64(obj, "disk_usage", name)?,
            memory_usage: optional_f64(obj, "memory_usage", name)?,
        }),
        RecommendationKind::Break => {
            let recommend_break = required(obj, name, "recommend_break")?
                .as_bool()
                .ok_or_else(|| WorkpulseError::malformed("recommend_break must be a boolean"))?;
            let session_duration = optional_f64(obj, "session_duration", name)?;
            if recommend_break && session_duration.is_none() {
                return Err(WorkpulseError::MissingField {
                    kind: "break",
                    field: "session_duration".to_string(),
                });
            }

            RecommendationPayload::Break(BreakRecommendation {
                recommend_break,
                session_duration,
                break_type: optional_str(obj, "break_type"),
                message: optional_str(obj, "message"),
            })
        }
        RecommendationKind::WorkloadOptimization => {
            RecommendationPayload::WorkloadOptimization(WorkloadOptimization {
                suggestions: required_str_list(obj, name, "suggestions")?,
                priority: required_str(obj, name, "priority")?.parse()?,
            })
        }
    };

    Ok(payload)
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    kind: &'static str,
    field: &str,
) -> Result<&'a Value> {
    match obj.get(field) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(WorkpulseError::MissingField {
            kind,
            field: field.to_string(),
        }),
    }
}

fn required_str(obj: &Map<String, Value>, kind: &'static str, field: &str) -> Result<String> {
    required(obj, kind, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| WorkpulseError::malformed(format!("{}.{} must be a string", kind, field)))
}

fn required_str_list(obj: &Map<String, Value>, kind: &'static str, field: &str) -> Result<Vec<String>> {
    let items = required(obj, kind, field)?
        .as_array()
        .ok_or_else(|| WorkpulseError::malformed(format!("{}.{} must be a list", kind, field)))?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                WorkpulseError::malformed(format!("{}.{} must contain only strings", kind, field))
            })
        })
        .collect()
}

fn optional_f64(obj: &Map<String, Value>, field: &str, kind: &str) -> Result<Option<f64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            WorkpulseError::malformed(format!("{}.{} must be a number", kind, field))
        }),
    }
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}
