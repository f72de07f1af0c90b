//! Risk label construction for training. Three mutually exclusive policies
//! behind one interface; adding a policy means adding a variant.

pub mod isolation;

use crate::config::LabelingConfig;
use crate::features::frame::{percentile, FeatureFrame};
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use tracing::info;

use isolation::IsolationForest;

/// Signals the anomaly policy samples from, when available.
const ANOMALY_SIGNALS: [&str; 5] = [
    "speed",
    "acceleration",
    "rpm",
    "engine_temperature",
    "throttle_position",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Weighted multi-signal score, top 15% by percentile flagged high risk.
    Composite,
    /// OR of fixed absolute thresholds.
    Threshold,
    /// Isolation-forest outliers flagged high risk.
    Anomaly,
}

/// Per-record training labels. Raw composite scores exist only under the
/// Composite policy.
#[derive(Debug, Clone)]
pub struct RiskLabels {
    pub is_high_risk: Vec<bool>,
    pub risk_level: Vec<RiskLevel>,
    pub raw_score: Option<Vec<f64>>,
}

impl LabelPolicy {
    pub fn label(self, frame: &FeatureFrame, config: &LabelingConfig) -> RiskLabels {
        let labels = match self {
            LabelPolicy::Composite => composite(frame, config),
            LabelPolicy::Threshold => threshold(frame),
            LabelPolicy::Anomaly => anomaly(frame, config),
        };
        let high = labels.is_high_risk.iter().filter(|&&h| h).count();
        info!(
            policy = ?self,
            high_risk = high,
            total = labels.is_high_risk.len(),
            "risk labels created"
        );
        labels
    }
}

/// Accumulate an integer score from independently weighted threshold bands,
/// then cut at the series' own percentile.
fn composite(frame: &FeatureFrame, config: &LabelingConfig) -> RiskLabels {
    let n = frame.len();
    let mut score = vec![0.0f64; n];

    if let Some(speed) = frame.column("speed") {
        for (s, v) in score.iter_mut().zip(speed) {
            *s += band(*v, 60.0, 80.0, 100.0);
        }
    }
    if let Some(accel) = frame.column("acceleration") {
        for (s, v) in score.iter_mut().zip(accel) {
            *s += band(v.abs(), 0.2, 0.3, 0.5);
        }
    }
    if let Some(rpm) = frame.column("rpm") {
        for (s, v) in score.iter_mut().zip(rpm) {
            *s += if *v > 5000.0 {
                2.0
            } else if *v > 4000.0 {
                1.0
            } else {
                0.0
            };
        }
    }
    if let Some(temp) = frame.column("engine_temperature") {
        for (s, v) in score.iter_mut().zip(temp) {
            *s += if *v > 110.0 {
                2.0
            } else if *v > 100.0 {
                1.0
            } else {
                0.0
            };
        }
    }
    if let Some(vol) = frame.column("speed_std_30s") {
        let cut = percentile(vol, 80.0);
        for (s, v) in score.iter_mut().zip(vol) {
            if *v > cut {
                *s += 1.0;
            }
        }
    }
    if let Some(stress) = frame.column("high_stress") {
        for (s, v) in score.iter_mut().zip(stress) {
            *s += v * 2.0;
        }
    }
    if let Some(weather) = frame.column("weather_risk") {
        for (s, v) in score.iter_mut().zip(weather) {
            *s += v;
        }
    }

    let cut = percentile(&score, config.high_risk_percentile);
    let is_high_risk: Vec<bool> = score.iter().map(|&s| s >= cut).collect();
    let (lo, hi) = config.level_cuts;
    let risk_level = score
        .iter()
        .map(|&s| {
            if s <= lo {
                RiskLevel::Low
            } else if s <= hi {
                RiskLevel::Medium
            } else {
                RiskLevel::High
            }
        })
        .collect();

    RiskLabels {
        is_high_risk,
        risk_level,
        raw_score: Some(score),
    }
}

/// Three-step threshold band: returns 1/2/3 as the value crosses each cut.
fn band(value: f64, c1: f64, c2: f64, c3: f64) -> f64 {
    if value > c3 {
        3.0
    } else if value > c2 {
        2.0
    } else if value > c1 {
        1.0
    } else {
        0.0
    }
}

fn threshold(frame: &FeatureFrame) -> RiskLabels {
    let n = frame.len();
    let mut flagged = vec![false; n];

    let mut apply = |col: Option<&[f64]>, pred: fn(f64) -> bool| {
        if let Some(values) = col {
            for (f, v) in flagged.iter_mut().zip(values) {
                *f |= pred(*v);
            }
        }
    };
    apply(frame.column("speed"), |v| v > 90.0);
    apply(frame.column("acceleration"), |v| v.abs() > 0.4);
    apply(frame.column("rpm"), |v| v > 4500.0);
    apply(frame.column("engine_temperature"), |v| v > 105.0);

    let risk_level = flagged
        .iter()
        .map(|&f| if f { RiskLevel::High } else { RiskLevel::Low })
        .collect();
    RiskLabels {
        is_high_risk: flagged,
        risk_level,
        raw_score: None,
    }
}

fn anomaly(frame: &FeatureFrame, config: &LabelingConfig) -> RiskLabels {
    let n = frame.len();
    let columns: Vec<&[f64]> = ANOMALY_SIGNALS
        .iter()
        .filter_map(|name| frame.column(name))
        .collect();

    let is_high_risk = if columns.is_empty() {
        vec![false; n]
    } else {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                columns
                    .iter()
                    .map(|c| if c[i].is_nan() { 0.0 } else { c[i] })
                    .collect()
            })
            .collect();
        let forest = IsolationForest::fit(&rows, config.contamination);
        forest.outliers(&rows)
    };

    let risk_level = is_high_risk
        .iter()
        .map(|&f| if f { RiskLevel::High } else { RiskLevel::Low })
        .collect();
    RiskLabels {
        is_high_risk,
        risk_level,
        raw_score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelingConfig;

    fn frame_with(name: &str, values: Vec<f64>) -> FeatureFrame {
        let mut f = FeatureFrame::new(values.len());
        f.insert(name, values);
        f
    }

    #[test]
    fn composite_score_monotone_in_speed() {
        let config = LabelingConfig::default();
        let speeds = [50.0, 61.0, 81.0, 101.0];
        let mut last = -1.0;
        for &s in &speeds {
            let frame = frame_with("speed", vec![s; 4]);
            let labels = LabelPolicy::Composite.label(&frame, &config);
            let score = labels.raw_score.unwrap()[0];
            assert!(score > last, "score must rise across band {s}");
            last = score;
        }
    }

    #[test]
    fn composite_percentile_flags_top_tail() {
        let config = LabelingConfig::default();
        // 17 quiet samples, 3 crossing every band: exactly the top 15%.
        let mut speed = vec![30.0; 17];
        speed.extend([120.0, 120.0, 120.0]);
        let frame = frame_with("speed", speed);
        let labels = LabelPolicy::Composite.label(&frame, &config);
        let flagged = labels.is_high_risk.iter().filter(|&&h| h).count();
        assert_eq!(flagged, 3);
        let scores = labels.raw_score.unwrap();
        let cut = percentile(&scores, 85.0);
        for (i, &h) in labels.is_high_risk.iter().enumerate() {
            assert_eq!(h, scores[i] >= cut);
        }
    }

    #[test]
    fn composite_levels_bucket_raw_score() {
        let config = LabelingConfig::default();
        let frame = frame_with("speed", vec![30.0, 70.0, 120.0]);
        // Scores 0, 1, 3.
        let labels = LabelPolicy::Composite.label(&frame, &config);
        assert_eq!(labels.risk_level[0], RiskLevel::Low);
        assert_eq!(labels.risk_level[1], RiskLevel::Low);
        assert_eq!(labels.risk_level[2], RiskLevel::Medium);
    }

    #[test]
    fn threshold_policy_is_or_of_conditions() {
        let mut frame = FeatureFrame::new(3);
        frame.insert("speed", vec![50.0, 95.0, 50.0]);
        frame.insert("rpm", vec![2000.0, 2000.0, 4600.0]);
        let labels = LabelPolicy::Threshold.label(&frame, &LabelingConfig::default());
        assert_eq!(labels.is_high_risk, vec![false, true, true]);
        assert_eq!(labels.risk_level[1], RiskLevel::High);
        assert!(labels.raw_score.is_none());
    }

    #[test]
    fn anomaly_policy_flags_contamination_fraction() {
        let mut speed: Vec<f64> = (0..50).map(|i| 50.0 + (i % 5) as f64).collect();
        speed[10] = 500.0;
        speed[30] = -200.0;
        let frame = frame_with("speed", speed);
        let labels = LabelPolicy::Anomaly.label(&frame, &LabelingConfig::default());
        let flagged = labels.is_high_risk.iter().filter(|&&h| h).count();
        assert!(flagged > 0 && flagged <= 10);
        assert!(labels.is_high_risk[10]);
        assert!(labels.is_high_risk[30]);
    }
}
