// Workload orchestration: classification, engine invocation, dispatch

pub mod controller;
pub mod dispatcher;
pub mod engine;
pub mod metrics;
pub mod recommendation;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod workload;

pub use controller::{CompletionReport, Orchestrator, OrchestratorSettings, TickReport};
pub use dispatcher::{
    Decision, DispatchPolicy, Dispatcher, Notifier, RecordingNotifier, RecordingThemeManager,
    SideEffect, ThemeManager, Verdict,
};
pub use engine::{
    resolve_document, run_engine, EngineArgs, EngineCommand, EngineCompletion, EngineConfig,
    EngineInvocation, EngineOutcome, EnginePurpose, InvocationStatus, RecommendationClient,
};
pub use metrics::{MetricSource, ResourceUsage, StaticMetricSource, SysinfoMetricSource};
pub use recommendation::{
    parse_engine_output, BreakRecommendation, CleanupRecommendation, PerformanceRecommendation,
    Priority, Recommendation, RecommendationKind, RecommendationPayload, ThemeRecommendation,
    WorkloadOptimization,
};
pub use runtime::{ControlMessage, OrchestratorHandle, OrchestratorRuntime};
pub use scheduler::{ScheduleConfig, ScheduledTask, Scheduler, TaskKind};
pub use state::{
    AppliedTheme, FeedSnapshot, OrchestratorState, RecommendationHistory, WorkloadChange,
};
pub use workload::{
    ClassificationResult, ClassifierConfig, ClassifierRule, WorkloadClassifier, WorkloadLabel,
};
