//! Maps model probabilities onto risk categories with configurable thresholds.

use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64, config: &RiskConfig) -> Self {
        if probability >= config.high_threshold {
            RiskLevel::High
        } else if probability >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Scored outcome for a single telemetry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub record_index: usize,
    pub probability: f64,
    pub level: RiskLevel,
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, record_index: usize, probability: f64) -> RiskResult {
        let level = RiskLevel::from_probability(probability, &self.config);
        RiskResult {
            record_index,
            probability,
            level,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}
