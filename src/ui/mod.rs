// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{
    describe_recommendation, format_confidence, format_resources, format_snapshot_line,
    format_time, format_workload, print_classification, print_decision, print_recommendation,
};
