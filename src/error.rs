use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::core::orchestrator::EnginePurpose;

/// Custom error type for the workpulse orchestrator
#[derive(Error, Debug)]
pub enum WorkpulseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to launch analysis engine: {0}")]
    EngineSpawn(String),

    #[error("A {0} invocation is already in flight")]
    InvocationPending(EnginePurpose),

    #[error("Analysis engine {purpose} exited with code {code:?}: {stderr}")]
    EngineFailed {
        purpose: EnginePurpose,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Analysis engine {purpose} timed out after {timeout:?}")]
    EngineTimeout {
        purpose: EnginePurpose,
        timeout: Duration,
    },

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("{kind} recommendation is missing required field '{field}'")]
    MissingField { kind: &'static str, field: String },

    #[error("Unknown workload label: {0}")]
    UnknownWorkload(String),
}

/// Result type alias for workpulse
pub type Result<T> = std::result::Result<T, WorkpulseError>;

impl WorkpulseError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        WorkpulseError::Config(msg.into())
    }

    /// Create an engine spawn error
    pub fn engine_spawn<S: Into<String>>(msg: S) -> Self {
        WorkpulseError::EngineSpawn(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        WorkpulseError::MalformedResponse(msg.into())
    }

    /// Transient engine failures are recovered locally and retried on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WorkpulseError::EngineSpawn(_)
                | WorkpulseError::EngineFailed { .. }
                | WorkpulseError::EngineTimeout { .. }
                | WorkpulseError::MalformedResponse(_)
                | WorkpulseError::MissingField { .. }
                | WorkpulseError::UnknownWorkload(_)
                | WorkpulseError::Json(_)
        )
    }
}
