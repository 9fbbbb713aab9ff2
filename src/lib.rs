// workpulse library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, WorkpulseError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;
pub use core::orchestrator::{
    Orchestrator, OrchestratorHandle, OrchestratorRuntime, OrchestratorState, WorkloadLabel,
};

// Initialize logging
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
