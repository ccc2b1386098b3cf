//! Percentile-adaptive stress labeling

pub mod labeler;
pub mod thresholds;

pub use labeler::{LabelError, LabelRuleConfig, LabeledTable, StressLabeler};
pub use thresholds::{percentile, PercentileThresholds};
