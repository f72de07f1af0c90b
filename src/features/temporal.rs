//! Temporal feature engine: rolling statistics, lags, and rates of change
//! over the per-second series, plus smoothed signals and derived composites.
//!
//! Everything operates on sample counts. Trailing windows shorter than the
//! window size use however many samples exist (min-period 1); lag values
//! before the series start are backfilled with the first sample.

use super::derived;
use super::frame::{sample_std, FeatureFrame};
use super::smooth::savgol_smooth;
use crate::config::FeaturesConfig;
use crate::telemetry::{SeriesSchema, CORE_SIGNALS};
use tracing::info;

/// Signals that receive a smoothed companion column.
const SMOOTHED_SIGNALS: [&str; 3] = ["speed", "acceleration", "rpm"];

pub struct TemporalFeatureEngine {
    config: FeaturesConfig,
}

impl TemporalFeatureEngine {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Add all temporal and derived columns to the frame. Deterministic:
    /// identical input frames yield bit-identical output frames.
    pub fn augment(&self, frame: &mut FeatureFrame, schema: &SeriesSchema) {
        let n = frame.len();

        for signal in CORE_SIGNALS {
            let Some(values) = frame.column(signal).map(<[f64]>::to_vec) else {
                continue;
            };

            for &w in &self.config.windows {
                // Windows the series cannot fill at least once are skipped.
                if n <= w {
                    continue;
                }
                frame.insert(format!("{signal}_mean_{w}s"), rolling_mean(&values, w));
                frame.insert(format!("{signal}_std_{w}s"), rolling_std(&values, w));
                frame.insert(format!("{signal}_max_{w}s"), rolling_max(&values, w));
                frame.insert(format!("{signal}_min_{w}s"), rolling_min(&values, w));
            }

            for &lag in &self.config.lags {
                if n <= lag {
                    continue;
                }
                frame.insert(format!("{signal}_lag_{lag}s"), lag_backfilled(&values, lag));
            }

            let diff = first_diff(&values);
            let abs: Vec<f64> = diff.iter().map(|v| v.abs()).collect();
            frame.insert(format!("{signal}_rate_change"), diff);
            frame.insert(format!("{signal}_rate_change_abs"), abs);
        }

        for signal in SMOOTHED_SIGNALS {
            if let Some(values) = frame.column(signal).map(<[f64]>::to_vec) {
                frame.insert(
                    format!("{signal}_smooth"),
                    savgol_smooth(&values, self.config.smooth_window_cap),
                );
            }
        }

        derived::add_derived(frame, schema, &self.config);

        info!(columns = frame.num_columns(), "temporal features created");
    }
}

/// Trailing-window mean with min-period 1.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        out.push(sum / (i.min(window - 1) + 1) as f64);
    }
    out
}

/// Trailing-window sample std with min-period 1; a 1-sample window is 0.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            sample_std(&values[start..=i])
        })
        .collect()
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i].iter().copied().fold(f64::MIN, f64::max)
        })
        .collect()
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i].iter().copied().fold(f64::MAX, f64::min)
        })
        .collect()
}

/// Value `lag` samples back; positions before the start take the first value.
pub fn lag_backfilled(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i < lag { values[0] } else { values[i - lag] })
        .collect()
}

/// First difference; index 0 is defined as 0.
pub fn first_diff(values: &[f64]) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i == 0 { 0.0 } else { values[i] - values[i - 1] })
        .collect()
}
