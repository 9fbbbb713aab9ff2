//! Named periodic tasks driven by a single clock.
//!
//! The scheduler never sleeps: callers pass `now` to [`Scheduler::due`] and get
//! back the tasks whose interval has elapsed. Tests can therefore fast-forward
//! logical time by handing in later instants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Re-sample process names and resource usage
    MetricsRefresh,
    /// Run the workload classifier
    WorkloadDetection,
    /// `collect` followed by `recommend`
    RecommendationCycle,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::MetricsRefresh => "metrics refresh",
            TaskKind::WorkloadDetection => "workload detection",
            TaskKind::RecommendationCycle => "recommendation cycle",
        })
    }
}

/// Task cadences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub metrics_interval_secs: u64,
    pub workload_interval_secs: u64,
    pub recommendation_interval_secs: u64,
    /// Pull the next recommendation cycle forward when the workload changes
    pub recommend_on_workload_change: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            metrics_interval_secs: 1,
            workload_interval_secs: 30,
            recommendation_interval_secs: 300,
            recommend_on_workload_change: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub interval: Duration,
    pub enabled: bool,
    pub last_run: Option<Instant>,
}

impl ScheduledTask {
    pub fn new(kind: TaskKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            enabled: true,
            last_run: None,
        }
    }

    /// A task that never ran is due immediately.
    pub fn is_due(&self, now: Instant) -> bool {
        self.enabled
            && self
                .last_run
                .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        let mut scheduler = Self::new();
        scheduler.register(
            TaskKind::MetricsRefresh,
            Duration::from_secs(config.metrics_interval_secs.max(1)),
        );
        scheduler.register(
            TaskKind::WorkloadDetection,
            Duration::from_secs(config.workload_interval_secs.max(1)),
        );
        scheduler.register(
            TaskKind::RecommendationCycle,
            Duration::from_secs(config.recommendation_interval_secs.max(1)),
        );
        scheduler
    }

    /// Add a task or replace the interval of an existing one.
    ///
    /// Tasks fire in registration order within one tick.
    pub fn register(&mut self, kind: TaskKind, interval: Duration) {
        match self.tasks.iter_mut().find(|t| t.kind == kind) {
            Some(task) => task.interval = interval,
            None => self.tasks.push(ScheduledTask::new(kind, interval)),
        }
    }

    pub fn task(&self, kind: TaskKind) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.kind == kind)
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn set_enabled(&mut self, kind: TaskKind, enabled: bool) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            task.enabled = enabled;
        }
    }

    /// Make a task due on the next call to [`Scheduler::due`].
    pub fn expedite(&mut self, kind: TaskKind) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            task.last_run = None;
        }
    }

    pub fn mark_run(&mut self, kind: TaskKind, now: Instant) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            task.last_run = Some(now);
        }
    }

    /// Tasks due at `now`, marked as run.
    pub fn due(&mut self, now: Instant) -> Vec<TaskKind> {
        self.tasks
            .iter_mut()
            .filter(|task| task.is_due(now))
            .map(|task| {
                task.last_run = Some(now);
                task.kind
            })
            .collect()
    }

    /// Finest interval among enabled tasks; the event loop ticks at this rate.
    pub fn resolution(&self) -> Duration {
        self.tasks
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.interval)
            .min()
            .unwrap_or(Duration::from_secs(1))
    }
}
