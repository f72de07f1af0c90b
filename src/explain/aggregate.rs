//! Series-level rollup of per-record attributions.

use super::AttributionRecord;
use crate::features::frame::sample_std;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    /// Mean |contribution|: how much the feature moves predictions at all.
    pub mean_abs: f64,
    /// Mean signed contribution: net push toward or away from high risk.
    pub mean_signed: f64,
    /// Contribution volatility across the series.
    pub std: f64,
    pub max_abs: f64,
}

/// Series-wide summary of the attribution output as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionSummary {
    /// Shared base level in log-odds; identical for every record of a series.
    pub base: f64,
    /// Mean of each record's total contribution.
    pub mean_total_contribution: f64,
    pub max_final_score: f64,
    pub min_final_score: f64,
    /// Standard deviation of the final scores across the series.
    pub volatility: f64,
}

/// Summarize a series of attributions; None when the series is empty.
pub fn summarize(records: &[AttributionRecord]) -> Option<AttributionSummary> {
    let first = records.first()?;
    let totals: Vec<f64> = records
        .iter()
        .map(|r| r.contributions.iter().sum::<f64>())
        .collect();
    let finals: Vec<f64> = records.iter().map(|r| r.final_score).collect();
    Some(AttributionSummary {
        base: first.base,
        mean_total_contribution: totals.iter().sum::<f64>() / totals.len() as f64,
        max_final_score: finals.iter().fold(f64::MIN, |m, &v| m.max(v)),
        min_final_score: finals.iter().fold(f64::MAX, |m, &v| m.min(v)),
        volatility: sample_std(&finals),
    })
}

/// Aggregate attributions across a series, strongest features first.
pub fn aggregate(records: &[AttributionRecord], names: &[String]) -> Vec<FeatureImportance> {
    if records.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<FeatureImportance> = names
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<f64> = records.iter().map(|r| r.contributions[col]).collect();
            let n = values.len() as f64;
            FeatureImportance {
                name: name.clone(),
                mean_abs: values.iter().map(|c| c.abs()).sum::<f64>() / n,
                mean_signed: values.iter().sum::<f64>() / n,
                std: sample_std(&values),
                max_abs: values.iter().fold(0.0f64, |m, c| m.max(c.abs())),
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.mean_abs
            .partial_cmp(&a.mean_abs)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, contributions: Vec<f64>) -> AttributionRecord {
        AttributionRecord {
            record_index: index,
            base: 0.0,
            final_score: 0.5,
            contributions,
        }
    }

    #[test]
    fn ranks_by_mean_absolute_contribution() {
        let names = vec!["speed".to_string(), "rpm".to_string()];
        let records = vec![
            record(0, vec![0.5, -0.1]),
            record(1, vec![-0.5, 0.1]),
        ];
        let agg = aggregate(&records, &names);
        assert_eq!(agg[0].name, "speed");
        assert!((agg[0].mean_abs - 0.5).abs() < 1e-12);
        // Opposite signs cancel in the net direction.
        assert!(agg[0].mean_signed.abs() < 1e-12);
        assert!((agg[1].max_abs - 0.1).abs() < 1e-12);
    }

    #[test]
    fn empty_series_yields_nothing() {
        assert!(aggregate(&[], &["speed".to_string()]).is_empty());
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn summary_tracks_base_and_score_extremes() {
        let mut a = record(0, vec![0.4, 0.2]);
        a.base = -1.0;
        a.final_score = 0.9;
        let mut b = record(1, vec![-0.4, -0.2]);
        b.base = -1.0;
        b.final_score = 0.1;

        let summary = summarize(&[a, b]).unwrap();
        assert_eq!(summary.base, -1.0);
        assert!(summary.mean_total_contribution.abs() < 1e-12);
        assert_eq!(summary.max_final_score, 0.9);
        assert_eq!(summary.min_final_score, 0.1);
        assert!(summary.volatility > 0.0);
    }
}
