use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{Result, WorkpulseError};

/// Resolve a program name against `PATH`, or accept it as-is if it is a path.
pub fn locate_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.exists().then(|| path.to_path_buf());
    }
    which::which(program).ok()
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

/// Launch a command without waiting for it.
///
/// Must be called from within a Tokio runtime. A background task waits on the
/// child so it never lingers as a zombie; its exit status is only logged.
pub fn spawn_detached(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| WorkpulseError::config("empty command"))?;

    let runtime = tokio::runtime::Handle::try_current().map_err(io::Error::other)?;

    let program = expand_home(program);
    let mut child = Command::new(&program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let label = program.display().to_string();
    runtime.spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => log::warn!("{} exited with {}", label, status),
            Ok(_) => {}
            Err(e) => log::warn!("Failed to wait for {}: {}", label, e),
        }
    });

    Ok(())
}

/// Substitute `{name}` placeholders in every argument.
pub fn render_template(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{}}}", key), value)
            })
        })
        .collect()
}
