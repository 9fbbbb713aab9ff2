// Concrete collaborators backed by desktop commands

pub mod notify;
pub mod process;
pub mod theme;

pub use notify::{CommandNotifier, NotificationConfig};
pub use process::{expand_home, locate_program, render_template, spawn_detached};
pub use theme::{CommandThemeManager, ThemeConfig};
