//! Additive attribution for the boosted ensemble plus an independent
//! rule-based cross-check. Every attribution satisfies
//! `sigmoid(base + sum(contributions)) == predicted probability`.

pub mod aggregate;
pub mod moments;
pub mod rules;
pub mod tree_path;

pub use aggregate::{aggregate, summarize, AttributionSummary, FeatureImportance};
pub use moments::{key_moments, KeyMoment};
pub use rules::{RuleAssessment, RuleEngine};
pub use tree_path::PathAttributor;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// One feature's share of a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Feature value at this record.
    pub value: f64,
    /// Signed log-odds contribution.
    pub contribution: f64,
}

/// Additive decomposition of one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionRecord {
    pub record_index: usize,
    /// Log-odds before any split adjustment (model prior plus root values).
    pub base: f64,
    /// Per-feature log-odds contributions, aligned with the model layout.
    pub contributions: Vec<f64>,
    /// Probability reconstructed from `base` and `contributions`.
    pub final_score: f64,
}

impl AttributionRecord {
    /// The strongest contributors by magnitude, largest first.
    pub fn top_contributions(
        &self,
        names: &[String],
        row: ArrayView1<f64>,
        limit: usize,
    ) -> Vec<FeatureContribution> {
        let mut ranked: Vec<FeatureContribution> = self
            .contributions
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0.0)
            .map(|(i, &c)| FeatureContribution {
                name: names[i].clone(),
                value: row[i],
                contribution: c,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Decomposes predictions into per-feature additive contributions.
pub trait AdditiveExplainer {
    fn attribute(&self, record_index: usize, row: ArrayView1<f64>) -> AttributionRecord;
}
