// Core business logic module

pub mod config;
pub mod orchestrator;

// Re-export commonly used items
pub use config::Config;
pub use orchestrator::{
    Orchestrator, OrchestratorHandle, OrchestratorRuntime, OrchestratorSettings,
    OrchestratorState, WorkloadClassifier, WorkloadLabel,
};
