//! Key-moment breakdown: for each record scoring above a caller-supplied
//! threshold, the strongest contributors cross-referenced against their
//! rule-based bucket.

use super::rules::RuleEngine;
use super::AttributionRecord;
use crate::risk::RiskLevel;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

const TOP_FEATURES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentFeature {
    pub name: String,
    pub value: f64,
    pub contribution: f64,
    /// Rule bucket for the underlying signal; None when no rule covers it.
    pub rule_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMoment {
    pub record_index: usize,
    pub probability: f64,
    pub top: Vec<MomentFeature>,
}

/// Break down every record with probability above `threshold`.
/// `matrix` rows and `attributions` are aligned with `probabilities`.
pub fn key_moments(
    attributions: &[AttributionRecord],
    probabilities: &[f64],
    matrix: ArrayView2<f64>,
    names: &[String],
    threshold: f64,
) -> Vec<KeyMoment> {
    attributions
        .iter()
        .zip(probabilities)
        .filter(|(_, &p)| p > threshold)
        .map(|(record, &probability)| {
            let row = matrix.row(record.record_index);
            let top = record
                .top_contributions(names, row, TOP_FEATURES)
                .into_iter()
                .map(|c| MomentFeature {
                    rule_level: RuleEngine::level_for_feature(&c.name, c.value),
                    name: c.name,
                    value: c.value,
                    contribution: c.contribution,
                })
                .collect();
            KeyMoment {
                record_index: record.record_index,
                probability,
                top,
            }
        })
        .collect()
}
