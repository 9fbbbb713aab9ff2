use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::orchestrator::{
    ClassifierConfig, DispatchPolicy, EngineConfig, OrchestratorSettings, ScheduleConfig,
};
use crate::platform::{expand_home, NotificationConfig, ThemeConfig};

/// Recommendation cycles the theme cooldown must cover
const COOLDOWN_CYCLES: u64 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub policy: DispatchPolicy,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Missing, empty or unreadable-as-JSON files yield the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            // Happens when the format changes between versions
            log::warn!("Ignoring invalid config {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("workpulse").join("config.json"))
    }

    /// Set a value by dotted key, e.g. `policy.theme_cooldown_secs`.
    ///
    /// The value is parsed as JSON first (`600`, `true`, `["a","b"]`) and
    /// falls back to a plain string.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut tree = serde_json::to_value(&*self).context("Failed to serialize config")?;

        let pointer = format!("/{}", key.replace('.', "/"));
        let Some(node) = tree.pointer_mut(&pointer) else {
            bail!("Unknown config key: {}", key);
        };

        if node.is_object() {
            bail!("'{}' is a section; set one of its fields instead", key);
        }

        *node = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

        *self = serde_json::from_value(tree)
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
        Ok(())
    }

    /// Dispatch policy with the cooldown spanning at least two recommendation cycles
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        let mut policy = self.policy.clone();
        policy.theme_cooldown_secs = policy.theme_cooldown_secs.max(
            self.schedule
                .recommendation_interval_secs
                .saturating_mul(COOLDOWN_CYCLES),
        );
        policy
    }

    /// Settings for the orchestrator, with `~/` expanded in engine paths
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        let mut engine = self.engine.clone();
        engine.script = expand_home(&engine.script.to_string_lossy());
        engine.recommendations_file = engine
            .recommendations_file
            .map(|path| expand_home(&path.to_string_lossy()));

        OrchestratorSettings {
            engine,
            schedule: self.schedule.clone(),
            policy: self.dispatch_policy(),
            classifier: self.classifier.clone(),
        }
    }
}
