// Command handlers module
pub mod classify;
pub mod config;
pub mod feedback;
pub mod recommend;
pub mod run;

// Re-exports for cleaner imports
pub use classify::execute as classify;
pub use config::handle_config as config;
pub use feedback::execute as feedback;
pub use recommend::execute as recommend;
pub use run::execute as run;
