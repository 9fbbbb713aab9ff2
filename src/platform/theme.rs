use serde::{Deserialize, Serialize};

use super::process::{render_template, spawn_detached};
use crate::core::orchestrator::ThemeManager;

/// How themes get applied on this machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// argv template; `{theme}` is replaced with the theme name
    pub command: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "~/.config/hypr/scripts/theme-switcher.sh".to_string(),
                "{theme}".to_string(),
            ],
        }
    }
}

/// Applies themes by running the configured command
pub struct CommandThemeManager {
    template: Vec<String>,
}

impl CommandThemeManager {
    pub fn new(config: &ThemeConfig) -> Self {
        Self {
            template: config.command.clone(),
        }
    }

    pub fn command_for(&self, theme: &str) -> Vec<String> {
        render_template(&self.template, &[("theme", theme)])
    }
}

impl ThemeManager for CommandThemeManager {
    fn apply_theme(&self, theme: &str) {
        let argv = self.command_for(theme);
        log::debug!("Theme command: {}", argv.join(" "));
        if let Err(e) = spawn_detached(&argv) {
            log::warn!("Could not apply theme '{}': {}", theme, e);
        }
    }
}
