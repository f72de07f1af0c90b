//! Risk categorization and post-scoring analytics.

pub mod engine;
pub mod patterns;

pub use engine::{RiskEngine, RiskLevel, RiskResult};
pub use patterns::{analyze, PatternReport, RiskSpans};
