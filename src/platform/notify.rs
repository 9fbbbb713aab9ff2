use serde::{Deserialize, Serialize};

use super::process::{locate_program, spawn_detached};
use crate::core::orchestrator::Notifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub command: String,
    pub app_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "notify-send".to_string(),
            app_name: "workpulse".to_string(),
        }
    }
}

/// Desktop notifications through a `notify-send` compatible command
pub struct CommandNotifier {
    config: NotificationConfig,
    available: bool,
}

impl CommandNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        let available = config.enabled && locate_program(&config.command).is_some();
        if config.enabled && !available {
            log::warn!(
                "Notification command '{}' not found; notifications will only be logged",
                config.command
            );
        }

        Self {
            config: config.clone(),
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn command_for(&self, title: &str, body: &str) -> Vec<String> {
        vec![
            self.config.command.clone(),
            "--app-name".to_string(),
            self.config.app_name.clone(),
            title.to_string(),
            body.to_string(),
        ]
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, body: &str) {
        log::info!("Notification: {} - {}", title, body);
        if !self.available {
            return;
        }
        if let Err(e) = spawn_detached(&self.command_for(title, body)) {
            log::warn!("Failed to send notification: {}", e);
        }
    }
}
