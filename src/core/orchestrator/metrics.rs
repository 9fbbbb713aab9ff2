//! Metric sources: running process names and coarse resource usage.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System,
};

/// Resource usage sample taken on each metric refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub process_count: usize,
    pub sampled_at: i64, // Unix timestamp
}

/// Supplies the signals the classifier works from.
pub trait MetricSource: Send {
    /// Re-sample the underlying system
    fn refresh(&mut self);

    /// Names of processes seen by the last refresh
    fn running_process_names(&self) -> HashSet<String>;

    fn resource_usage(&self) -> Option<ResourceUsage>;
}

/// Live metric source backed by `sysinfo`
pub struct SysinfoMetricSource {
    system: System,
    sampled: bool,
}

impl SysinfoMetricSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram())
            .with_processes(ProcessRefreshKind::nothing());

        Self {
            system: System::new_with_specifics(refresh_kind),
            sampled: false,
        }
    }
}

impl Default for SysinfoMetricSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SysinfoMetricSource {
    fn refresh(&mut self) {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
        self.sampled = true;
    }

    fn running_process_names(&self) -> HashSet<String> {
        self.system
            .processes()
            .values()
            .map(|proc| proc.name().to_string_lossy().to_string())
            .collect()
    }

    fn resource_usage(&self) -> Option<ResourceUsage> {
        if !self.sampled {
            return None;
        }

        let total = self.system.total_memory();
        let used = self.system.used_memory();

        Some(ResourceUsage {
            cpu_percent: self.system.global_cpu_usage(),
            memory_percent: if total > 0 {
                (used as f32 / total as f32) * 100.0
            } else {
                0.0
            },
            memory_used_bytes: used,
            memory_total_bytes: total,
            process_count: self.system.processes().len(),
            sampled_at: chrono::Utc::now().timestamp(),
        })
    }
}

/// Fixture source whose process set can be swapped while the orchestrator owns it.
///
/// Clones share the same process set.
#[derive(Debug, Clone, Default)]
pub struct StaticMetricSource {
    processes: Arc<Mutex<HashSet<String>>>,
    usage: Arc<Mutex<Option<ResourceUsage>>>,
    refreshes: Arc<Mutex<usize>>,
}

impl StaticMetricSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::default();
        source.set_processes(names);
        source
    }

    pub fn set_processes<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.processes.lock() = names.into_iter().map(Into::into).collect();
    }

    pub fn set_resource_usage(&self, usage: ResourceUsage) {
        *self.usage.lock() = Some(usage);
    }

    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock()
    }
}

impl MetricSource for StaticMetricSource {
    fn refresh(&mut self) {
        *self.refreshes.lock() += 1;
    }

    fn running_process_names(&self) -> HashSet<String> {
        self.processes.lock().clone()
    }

    fn resource_usage(&self) -> Option<ResourceUsage> {
        self.usage.lock().clone()
    }
}
