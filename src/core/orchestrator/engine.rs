//! Asynchronous client for the external analysis engine.
//!
//! The engine is an opaque subprocess invoked as
//! `<runtime> <script> <purpose> [--flag value]*`. Each purpose owns one slot:
//! while an invocation is pending, a second request for the same purpose is
//! rejected synchronously. Results travel back to the event loop over an
//! mpsc channel as [`EngineCompletion`] messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{Result, WorkpulseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePurpose {
    Collect,
    Recommend,
    Feedback,
}

impl EnginePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnginePurpose::Collect => "collect",
            EnginePurpose::Recommend => "recommend",
            EnginePurpose::Feedback => "feedback",
        }
    }
}

impl fmt::Display for EnginePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine invocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpreter used to run the engine script (e.g. `python3`)
    pub runtime: String,
    pub script: PathBuf,
    pub timeout_secs: u64,
    /// File the engine also writes its recommendation document to
    pub recommendations_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let hypr_dir = dirs::home_dir()
            .unwrap_or_default()
            .join(".config")
            .join("hypr");

        Self {
            runtime: "python3".to_string(),
            script: hypr_dir.join("scripts").join("ai").join("learning-system.py"),
            timeout_secs: 60,
            recommendations_file: Some(
                hypr_dir.join("ai-enhancements").join("recommendations.json"),
            ),
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Extra `--flag value` pairs appended after the purpose
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineArgs {
    flags: Vec<(String, String)>,
}

impl EngineArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.flags.push((name.into(), value.into()));
        self
    }

    /// Arguments for a `feedback` invocation
    pub fn feedback<A: Into<String>, V: Into<String>>(action: A, value: V) -> Self {
        Self::new()
            .flag("feedback-action", action)
            .flag("feedback-value", value)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Fully resolved command line for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn build(config: &EngineConfig, purpose: EnginePurpose, extra: &EngineArgs) -> Self {
        let mut args = vec![
            config.script.to_string_lossy().to_string(),
            purpose.as_str().to_string(),
        ];

        for (name, value) in &extra.flags {
            let name = name.trim_start_matches('-');
            args.push(format!("--{}", name));
            args.push(value.clone());
        }

        Self {
            program: config.runtime.clone(),
            args,
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Record of one request to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInvocation {
    pub request_id: u64,
    pub purpose: EnginePurpose,
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub status: InvocationStatus,
}

/// How an engine process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    Succeeded { stdout: String },
    Failed { code: Option<i32>, stderr: String },
    TimedOut(Duration),
    SpawnFailed(String),
}

impl EngineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EngineOutcome::Succeeded { .. })
    }

    /// Stdout on success, otherwise the matching transient error
    pub fn into_result(self, purpose: EnginePurpose) -> Result<String> {
        match self {
            EngineOutcome::Succeeded { stdout } => Ok(stdout),
            EngineOutcome::Failed { code, stderr } => Err(WorkpulseError::EngineFailed {
                purpose,
                code,
                stderr: stderr.trim().to_string(),
            }),
            EngineOutcome::TimedOut(timeout) => {
                Err(WorkpulseError::EngineTimeout { purpose, timeout })
            }
            EngineOutcome::SpawnFailed(reason) => Err(WorkpulseError::engine_spawn(reason)),
        }
    }
}

/// Message delivered to the event loop when an invocation finishes
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCompletion {
    pub request_id: u64,
    pub purpose: EnginePurpose,
    pub outcome: EngineOutcome,
    pub finished_at: DateTime<Utc>,
}

/// Launches engine subprocesses without blocking the caller.
pub struct RecommendationClient {
    config: EngineConfig,
    in_flight: HashMap<EnginePurpose, EngineInvocation>,
    next_request_id: u64,
    completion_tx: mpsc::UnboundedSender<EngineCompletion>,
}

impl RecommendationClient {
    pub fn new(config: EngineConfig, completion_tx: mpsc::UnboundedSender<EngineCompletion>) -> Self {
        Self {
            config,
            in_flight: HashMap::new(),
            next_request_id: 1,
            completion_tx,
        }
    }

    /// Client plus the receiving end of its completion channel
    pub fn with_channel(config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<EngineCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(config, tx), rx)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_pending(&self, purpose: EnginePurpose) -> bool {
        self.in_flight.contains_key(&purpose)
    }

    pub fn pending(&self) -> impl Iterator<Item = &EngineInvocation> {
        self.in_flight.values()
    }

    /// Start an invocation in the background and return its request id.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`WorkpulseError::InvocationPending`] if the purpose slot is taken.
    pub fn invoke(&mut self, purpose: EnginePurpose, args: &EngineArgs) -> Result<u64> {
        if let Some(existing) = self.in_flight.get(&purpose) {
            log::debug!(
                "Rejecting {} invocation: request #{} still pending",
                purpose,
                existing.request_id
            );
            return Err(WorkpulseError::InvocationPending(purpose));
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let command = EngineCommand::build(&self.config, purpose, args);
        let timeout = self.config.timeout();

        self.in_flight.insert(
            purpose,
            EngineInvocation {
                request_id,
                purpose,
                command: command.to_string(),
                started_at: Utc::now(),
                status: InvocationStatus::Pending,
            },
        );

        log::debug!("Launching engine request #{}: {}", request_id, command);

        let completion_tx = self.completion_tx.clone();
        let recommendations_file = self.config.recommendations_file.clone();
        tokio::spawn(async move {
            let outcome = match run_engine(&command, timeout).await {
                EngineOutcome::Succeeded { stdout } => EngineOutcome::Succeeded {
                    stdout: resolve_document(purpose, stdout, recommendations_file.as_deref())
                        .await,
                },
                other => other,
            };
            let completion = EngineCompletion {
                request_id,
                purpose,
                outcome,
                finished_at: Utc::now(),
            };

            // Only fails once the event loop is gone
            if completion_tx.send(completion).is_err() {
                log::trace!("Dropping engine result #{}: receiver closed", request_id);
            }
        });

        Ok(request_id)
    }

    /// Release the purpose slot held by this completion.
    ///
    /// Returns `None` for completions that do not match the pending request,
    /// so a stale or duplicate delivery is never applied twice.
    pub fn complete(&mut self, completion: &EngineCompletion) -> Option<EngineInvocation> {
        let matches = self
            .in_flight
            .get(&completion.purpose)
            .is_some_and(|pending| pending.request_id == completion.request_id);

        if !matches {
            log::warn!(
                "Ignoring unexpected {} completion for request #{}",
                completion.purpose,
                completion.request_id
            );
            return None;
        }

        let mut invocation = self.in_flight.remove(&completion.purpose)?;
        invocation.status = if completion.outcome.is_success() {
            InvocationStatus::Succeeded
        } else {
            InvocationStatus::Failed
        };
        Some(invocation)
    }
}

/// Pick the document to parse for a successful invocation.
///
/// The engine may print progress text instead of JSON and write the document
/// to `recommendations_file`; in that case the file wins. Empty stdout means
/// nothing to recommend and never consults the file.
pub async fn resolve_document(
    purpose: EnginePurpose,
    stdout: String,
    recommendations_file: Option<&Path>,
) -> String {
    let trimmed = stdout.trim();
    if purpose != EnginePurpose::Recommend || trimmed.is_empty() || trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    let Some(path) = recommendations_file else {
        return trimmed.to_string();
    };

    match tokio::fs::read_to_string(path).await {
        Ok(document) => {
            log::debug!("Reading recommendation document from {:?}", path);
            document
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => trimmed.to_string(),
        Err(e) => {
            log::warn!("Failed to read {:?}: {}", path, e);
            trimmed.to_string()
        }
    }
}

/// Run one engine process to completion, bounded by `timeout`.
///
/// A timed-out child is killed when its future is dropped.
pub async fn run_engine(command: &EngineCommand, timeout: Duration) -> EngineOutcome {
    let mut process = tokio::process::Command::new(&command.program);
    process
        .args(&command.args)
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    match tokio::time::timeout(timeout, process.output()).await {
        Err(_) => EngineOutcome::TimedOut(timeout),
        Ok(Err(e)) => EngineOutcome::SpawnFailed(format!("{}: {}", command.program, e)),
        Ok(Ok(output)) if output.status.success() => EngineOutcome::Succeeded {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        },
        Ok(Ok(output)) => EngineOutcome::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
    }
}
