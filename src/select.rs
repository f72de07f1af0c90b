//! Final feature selection: categorical encoding, degenerate-column and
//! correlation pruning, and the frozen training layout that inference must
//! reproduce column-for-column.

use crate::error::{Result, RiskError};
use crate::features::frame::{median, pearson, sample_std, FeatureFrame};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Columns that never enter the trainable feature set: raw GPS coordinates
/// stay out (their derived features remain); labels and timestamps are never
/// frame columns in the first place.
const BOOKKEEPING: [&str; 3] = ["seconds_elapsed", "latitude", "longitude"];

/// Fit-once / transform-many label encoder for one categorical feature.
/// The mapping is fitted during training and immutable afterwards; an unseen
/// value at transform time is a typed failure, not a silent re-fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEncoder {
    pub feature: String,
    pub classes: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit(feature: impl Into<String>, values: &[Option<String>]) -> Self {
        let mut classes: Vec<String> = values
            .iter()
            .map(|v| v.clone().unwrap_or_default())
            .collect();
        classes.sort();
        classes.dedup();
        Self {
            feature: feature.into(),
            classes,
        }
    }

    pub fn transform(&self, values: &[Option<String>]) -> Result<Vec<f64>> {
        values
            .iter()
            .map(|v| {
                let v = v.clone().unwrap_or_default();
                self.classes
                    .binary_search(&v)
                    .map(|i| i as f64)
                    .map_err(|_| RiskError::UnseenCategory {
                        feature: self.feature.clone(),
                        value: v,
                    })
            })
            .collect()
    }
}

/// Frozen output of a training-time fit: the exact ordered column layout,
/// per-column imputation medians, and any fitted encoders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorState {
    pub layout: Vec<String>,
    pub medians: Vec<f64>,
    pub encoder: Option<CategoryEncoder>,
}

pub struct FeatureSelector {
    correlation_threshold: f64,
}

impl FeatureSelector {
    pub fn new(correlation_threshold: f64) -> Self {
        Self {
            correlation_threshold,
        }
    }

    /// Fit the layout on a training frame and return it with the design
    /// matrix. Scan order is the frame's insertion order, so the pruning
    /// outcome is deterministic.
    pub fn fit(
        &self,
        frame: &FeatureFrame,
        weather: Option<&[Option<String>]>,
    ) -> Result<(SelectorState, Array2<f64>)> {
        let mut names: Vec<String> = frame
            .names()
            .iter()
            .filter(|n| !BOOKKEEPING.contains(&n.as_str()))
            .cloned()
            .collect();

        let encoder = weather.map(|values| CategoryEncoder::fit("current_weather", values));
        let encoded = match (&encoder, weather) {
            (Some(enc), Some(values)) => Some(enc.transform(values)?),
            _ => None,
        };
        if encoded.is_some() {
            names.push("current_weather".to_string());
        }

        // Materialize candidate columns, imputing leftover NaN with the
        // column median; drop all-NaN and zero-variance columns.
        let mut kept: Vec<(String, Vec<f64>, f64)> = Vec::new();
        for name in names {
            let raw: Vec<f64> = if name == "current_weather" {
                encoded.clone().unwrap()
            } else {
                frame
                    .column(&name)
                    .ok_or_else(|| RiskError::SchemaMismatch {
                        expected: name.clone(),
                        found: "missing column".into(),
                    })?
                    .to_vec()
            };
            let med = median(&raw);
            if med.is_nan() {
                debug!(column = %name, "dropped: all values missing");
                continue;
            }
            let col: Vec<f64> = raw
                .iter()
                .map(|&v| if v.is_nan() { med } else { v })
                .collect();
            if sample_std(&col) == 0.0 {
                debug!(column = %name, "dropped: zero variance");
                continue;
            }
            kept.push((name, col, med));
        }

        // Correlation prune: the later column of each offending pair goes.
        let mut dropped = vec![false; kept.len()];
        for i in 0..kept.len() {
            if dropped[i] {
                continue;
            }
            for j in (i + 1)..kept.len() {
                if dropped[j] {
                    continue;
                }
                if pearson(&kept[i].1, &kept[j].1).abs() > self.correlation_threshold {
                    debug!(kept = %kept[i].0, pruned = %kept[j].0, "correlated pair");
                    dropped[j] = true;
                }
            }
        }
        let pruned = dropped.iter().filter(|&&d| d).count();

        let survivors: Vec<(String, Vec<f64>, f64)> = kept
            .into_iter()
            .zip(dropped)
            .filter(|(_, d)| !d)
            .map(|(k, _)| k)
            .collect();
        if survivors.is_empty() {
            return Err(RiskError::InvalidData(
                "no usable feature columns after selection".into(),
            ));
        }

        let layout: Vec<String> = survivors.iter().map(|(n, _, _)| n.clone()).collect();
        let medians: Vec<f64> = survivors.iter().map(|(_, _, m)| *m).collect();
        let matrix = to_matrix(frame.len(), &survivors);

        info!(
            features = layout.len(),
            pruned_correlated = pruned,
            "feature layout fitted"
        );
        Ok((
            SelectorState {
                layout,
                medians,
                encoder,
            },
            matrix,
        ))
    }
}

impl SelectorState {
    /// Reproduce the training layout on a new frame. Missing columns are a
    /// schema mismatch; NaN entries take the training-time medians. Pruning
    /// and encoder fitting never re-run here.
    pub fn transform(
        &self,
        frame: &FeatureFrame,
        weather: Option<&[Option<String>]>,
    ) -> Result<Array2<f64>> {
        let n = frame.len();
        let mut matrix = Array2::zeros((n, self.layout.len()));
        for (j, name) in self.layout.iter().enumerate() {
            let col: Vec<f64> = if name == "current_weather" {
                let enc = self.encoder.as_ref().ok_or_else(|| RiskError::SchemaMismatch {
                    expected: name.clone(),
                    found: "no fitted encoder".into(),
                })?;
                let values = weather.ok_or_else(|| RiskError::SchemaMismatch {
                    expected: name.clone(),
                    found: "no categorical input".into(),
                })?;
                enc.transform(values)?
            } else {
                frame
                    .column(name)
                    .ok_or_else(|| RiskError::SchemaMismatch {
                        expected: name.clone(),
                        found: "missing column".into(),
                    })?
                    .to_vec()
            };
            let med = self.medians[j];
            for (i, &v) in col.iter().enumerate() {
                matrix[[i, j]] = if v.is_nan() { med } else { v };
            }
        }
        Ok(matrix)
    }
}

fn to_matrix(rows: usize, columns: &[(String, Vec<f64>, f64)]) -> Array2<f64> {
    let mut matrix = Array2::zeros((rows, columns.len()));
    for (j, (_, col, _)) in columns.iter().enumerate() {
        for (i, &v) in col.iter().enumerate() {
            matrix[[i, j]] = v;
        }
    }
    matrix
}
