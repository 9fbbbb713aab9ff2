//! The orchestrator: owns the state and drives every component from one place.
//!
//! All methods run on the event-loop thread. Engine invocations are launched
//! in the background and come back through [`Orchestrator::handle_completion`].

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::dispatcher::{Decision, DispatchPolicy, Dispatcher, Notifier, ThemeManager};
use super::engine::{
    EngineArgs, EngineCompletion, EngineConfig, EngineInvocation, EnginePurpose,
    RecommendationClient,
};
use super::metrics::MetricSource;
use super::recommendation::parse_engine_output;
use super::scheduler::{ScheduleConfig, Scheduler, TaskKind};
use super::state::{OrchestratorState, WorkloadChange};
use super::workload::{ClassificationResult, ClassifierConfig, WorkloadClassifier};
use crate::error::{Result, WorkpulseError};

/// Everything the orchestrator needs besides its collaborators
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub engine: EngineConfig,
    pub schedule: ScheduleConfig,
    pub policy: DispatchPolicy,
    pub classifier: ClassifierConfig,
}

/// What one scheduler tick did
#[derive(Debug, Default)]
pub struct TickReport {
    pub ran: Vec<TaskKind>,
    pub classification: Option<ClassificationResult>,
    pub workload_change: Option<WorkloadChange>,
    pub launched: Vec<(EnginePurpose, u64)>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.ran.is_empty()
    }
}

/// What handling one engine completion did
#[derive(Debug)]
pub enum CompletionReport {
    /// Did not match the pending request for its purpose
    Stale,
    /// Arrived while the orchestrator was disabled
    Discarded(EngineInvocation),
    /// Engine failure or unusable output; nothing changed
    Failed(EngineInvocation, WorkpulseError),
    Collected {
        invocation: EngineInvocation,
        recommend_request: Option<u64>,
    },
    FeedbackRecorded(EngineInvocation),
    Recommendations(EngineInvocation, Vec<Decision>),
}

pub struct Orchestrator {
    state: OrchestratorState,
    classifier: WorkloadClassifier,
    dispatcher: Dispatcher,
    client: RecommendationClient,
    scheduler: Scheduler,
    metrics: Box<dyn MetricSource>,
    recommend_on_workload_change: bool,
}

impl Orchestrator {
    pub fn new(
        classifier: WorkloadClassifier,
        dispatcher: Dispatcher,
        client: RecommendationClient,
        scheduler: Scheduler,
        metrics: Box<dyn MetricSource>,
    ) -> Self {
        let history_size = dispatcher.policy().history_size;
        Self {
            state: OrchestratorState::with_history_size(history_size),
            classifier,
            dispatcher,
            client,
            scheduler,
            metrics,
            recommend_on_workload_change: true,
        }
    }

    /// Build from settings; returns the receiver the event loop reads completions from.
    pub fn from_settings(
        settings: &OrchestratorSettings,
        theme_manager: Box<dyn ThemeManager>,
        notifier: Box<dyn Notifier>,
        metrics: Box<dyn MetricSource>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineCompletion>) {
        let (client, completion_rx) = RecommendationClient::with_channel(settings.engine.clone());
        let dispatcher = Dispatcher::new(settings.policy.clone(), theme_manager, notifier);

        let mut orchestrator = Self::new(
            WorkloadClassifier::from_config(&settings.classifier),
            dispatcher,
            client,
            Scheduler::from_config(&settings.schedule),
            metrics,
        );
        orchestrator.recommend_on_workload_change = settings.schedule.recommend_on_workload_change;

        (orchestrator, completion_rx)
    }

    /// Enable scheduling; state starts disabled until this is called.
    pub fn initialize(&mut self) {
        log::info!("Orchestrator enabled");
        self.state.set_enabled(true);
    }

    /// Disabling stops new ticks; in-flight invocations still finish
    /// but their results are discarded.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.state.is_enabled() != enabled {
            log::info!("Orchestrator {}", if enabled { "enabled" } else { "disabled" });
        }
        self.state.set_enabled(enabled);
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn client(&self) -> &RecommendationClient {
        &self.client
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run every task due at `now`. Nothing runs while disabled.
    ///
    /// A due recommendation cycle spawns an engine process, so this must be
    /// called inside a Tokio runtime.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        if !self.state.is_enabled() {
            return report;
        }

        report.ran = self.scheduler.due(now);
        for task in report.ran.clone() {
            match task {
                TaskKind::MetricsRefresh => self.refresh_metrics(),
                TaskKind::WorkloadDetection => {
                    let (result, change) = self.detect_workload();
                    report.classification = Some(result);
                    report.workload_change = change;
                }
                TaskKind::RecommendationCycle => {
                    // A workload change earlier in this tick already expedited it
                    self.scheduler.mark_run(TaskKind::RecommendationCycle, now);
                    match self.start_recommendation_cycle() {
                        Ok(id) => report.launched.push((EnginePurpose::Collect, id)),
                        Err(e) => log::warn!("Skipping recommendation cycle: {}", e),
                    }
                }
            }
        }

        report
    }

    pub fn refresh_metrics(&mut self) {
        self.metrics.refresh();
        if let Some(usage) = self.metrics.resource_usage() {
            self.state.record_resources(usage);
        }
    }

    /// Classify current processes and record the result.
    pub fn detect_workload(&mut self) -> (ClassificationResult, Option<WorkloadChange>) {
        let processes = self.metrics.running_process_names();
        let result = self.classifier.classify(&processes);
        let change = self.state.record_classification(&result);

        if let Some(change) = &change {
            log::info!(
                "Workload changed: {} -> {} (confidence {:.2})",
                change.previous,
                change.current,
                change.confidence
            );
            if self.recommend_on_workload_change {
                self.scheduler.expedite(TaskKind::RecommendationCycle);
            }
        } else {
            log::trace!("Workload unchanged: {}", result.label);
        }

        (result, change)
    }

    /// Launch `collect`; `recommend` follows once it completes.
    pub fn start_recommendation_cycle(&mut self) -> Result<u64> {
        self.client.invoke(EnginePurpose::Collect, &EngineArgs::new())
    }

    /// Launch `recommend` directly, skipping `collect`.
    pub fn request_recommendations(&mut self) -> Result<u64> {
        self.client.invoke(EnginePurpose::Recommend, &EngineArgs::new())
    }

    pub fn send_feedback(&mut self, action: &str, value: &str) -> Result<u64> {
        self.client
            .invoke(EnginePurpose::Feedback, &EngineArgs::feedback(action, value))
    }

    /// Apply one engine completion to the state.
    pub fn handle_completion(&mut self, completion: EngineCompletion, now: Instant) -> CompletionReport {
        let Some(invocation) = self.client.complete(&completion) else {
            return CompletionReport::Stale;
        };

        if !self.state.is_enabled() {
            log::debug!(
                "Discarding {} result #{}: orchestrator disabled",
                invocation.purpose,
                invocation.request_id
            );
            return CompletionReport::Discarded(invocation);
        }

        let purpose = completion.purpose;
        let stdout = match completion.outcome.into_result(purpose) {
            Ok(stdout) => stdout,
            Err(e) => {
                log::warn!("Engine request #{} failed: {}", invocation.request_id, e);
                // Collect failures still move the cycle on to recommend
                if purpose == EnginePurpose::Collect {
                    let recommend_request = self.chain_recommend();
                    return CompletionReport::Collected {
                        invocation,
                        recommend_request,
                    };
                }
                return CompletionReport::Failed(invocation, e);
            }
        };

        match purpose {
            EnginePurpose::Collect => {
                log::debug!("Usage data collected (request #{})", invocation.request_id);
                let recommend_request = self.chain_recommend();
                CompletionReport::Collected {
                    invocation,
                    recommend_request,
                }
            }
            EnginePurpose::Feedback => {
                log::info!("Feedback recorded (request #{})", invocation.request_id);
                CompletionReport::FeedbackRecorded(invocation)
            }
            EnginePurpose::Recommend => {
                let recommendations = parse_engine_output(&stdout);

                match recommendations {
                    Ok(recommendations) => {
                        log::debug!(
                            "Engine request #{} produced {} recommendation(s)",
                            invocation.request_id,
                            recommendations.len()
                        );
                        let mut decisions = Vec::with_capacity(recommendations.len());
                        for rec in &recommendations {
                            decisions.push(self.dispatcher.apply(rec, &mut self.state, now));
                        }
                        CompletionReport::Recommendations(invocation, decisions)
                    }
                    Err(e) => {
                        log::warn!(
                            "Discarding engine output of request #{}: {}",
                            invocation.request_id,
                            e
                        );
                        CompletionReport::Failed(invocation, e)
                    }
                }
            }
        }
    }

    fn chain_recommend(&mut self) -> Option<u64> {
        match self.request_recommendations() {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not start recommend after collect: {}", e);
                None
            }
        }
    }
}
