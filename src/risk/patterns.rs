//! Read-only analytics over a scored series: sustained risk spans, hourly
//! structure, and the relation between speed and predicted risk.

use crate::config::RiskConfig;
use crate::features::frame::{mean, pearson, sample_std};
use serde::{Deserialize, Serialize};

/// Contiguous runs of the high-risk mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSpans {
    pub count: usize,
    pub mean_duration: f64,
    pub longest: usize,
}

/// Compute span statistics over a boolean mask.
pub fn analyze_spans(mask: &[bool]) -> RiskSpans {
    let mut lengths = Vec::new();
    let mut run = 0usize;
    for &hot in mask {
        if hot {
            run += 1;
        } else if run > 0 {
            lengths.push(run);
            run = 0;
        }
    }
    if run > 0 {
        lengths.push(run);
    }
    let count = lengths.len();
    let longest = lengths.iter().copied().max().unwrap_or(0);
    let mean_duration = if count == 0 {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / count as f64
    };
    RiskSpans {
        count,
        mean_duration,
        longest,
    }
}

/// Mean predicted risk grouped by hour of day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyRisk {
    pub peak_hour: u32,
    pub peak_mean: f64,
    pub lowest_hour: u32,
    pub lowest_mean: f64,
    /// Standard deviation of the per-hour means.
    pub variation: f64,
}

fn hourly_risk(hours: &[f64], probabilities: &[f64]) -> Option<HourlyRisk> {
    let mut sums = [0.0f64; 24];
    let mut counts = [0usize; 24];
    for (&h, &p) in hours.iter().zip(probabilities) {
        let h = (h as usize).min(23);
        sums[h] += p;
        counts[h] += 1;
    }
    let means: Vec<(u32, f64)> = (0..24)
        .filter(|&h| counts[h] > 0)
        .map(|h| (h as u32, sums[h] / counts[h] as f64))
        .collect();
    if means.is_empty() {
        return None;
    }
    let (peak_hour, peak_mean) = means
        .iter()
        .copied()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;
    let (lowest_hour, lowest_mean) = means
        .iter()
        .copied()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;
    let values: Vec<f64> = means.iter().map(|&(_, m)| m).collect();
    Some(HourlyRisk {
        peak_hour,
        peak_mean,
        lowest_hour,
        lowest_mean,
        variation: sample_std(&values),
    })
}

/// How predicted risk varies with speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedRiskProfile {
    pub correlation: f64,
    /// Inclusive speed range, in input units, of the decile with the
    /// highest mean predicted risk.
    pub riskiest_range: (f64, f64),
    pub riskiest_mean: f64,
}

fn speed_risk_profile(speeds: &[f64], probabilities: &[f64]) -> Option<SpeedRiskProfile> {
    if speeds.len() < 10 {
        return None;
    }
    let correlation = pearson(speeds, probabilities);

    let mut order: Vec<usize> = (0..speeds.len()).collect();
    order.sort_by(|&a, &b| speeds[a].partial_cmp(&speeds[b]).unwrap());
    let bucket_len = speeds.len() / 10;

    let mut best: Option<SpeedRiskProfile> = None;
    for d in 0..10 {
        let start = d * bucket_len;
        // Last decile absorbs the remainder.
        let end = if d == 9 { speeds.len() } else { start + bucket_len };
        let idx = &order[start..end];
        let risk = idx.iter().map(|&i| probabilities[i]).sum::<f64>() / idx.len() as f64;
        if best.as_ref().map_or(true, |b| risk > b.riskiest_mean) {
            best = Some(SpeedRiskProfile {
                correlation,
                riskiest_range: (speeds[idx[0]], speeds[*idx.last().unwrap()]),
                riskiest_mean: risk,
            });
        }
    }
    best
}

/// Whole-series view of the scored output. The two threshold-anchored
/// metrics deliberately use different anchors: spans count any non-low
/// stretch (strictly above the medium threshold), while `high_risk_share`
/// counts only records at or above the high threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternReport {
    pub mean_risk: f64,
    pub risk_volatility: f64,
    /// Fraction of records with probability >= the high threshold.
    pub high_risk_share: f64,
    /// Runs of records with probability > the medium threshold.
    pub spans: RiskSpans,
    pub hourly: Option<HourlyRisk>,
    pub speed: Option<SpeedRiskProfile>,
}

/// Analyze a scored series. `hours` and `speeds` are aligned with
/// `probabilities`.
pub fn analyze(
    probabilities: &[f64],
    hours: &[f64],
    speeds: &[f64],
    config: &RiskConfig,
) -> PatternReport {
    let mask: Vec<bool> = probabilities
        .iter()
        .map(|&p| p > config.medium_threshold)
        .collect();
    let high = probabilities
        .iter()
        .filter(|&&p| p >= config.high_threshold)
        .count();
    let n = probabilities.len().max(1);
    PatternReport {
        mean_risk: mean(probabilities),
        risk_volatility: sample_std(probabilities),
        high_risk_share: high as f64 / n as f64,
        spans: analyze_spans(&mask),
        hourly: hourly_risk(hours, probabilities),
        speed: speed_risk_profile(speeds, probabilities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_count_runs() {
        let mask: Vec<bool> = [0, 1, 1, 0, 1, 1, 1, 0].iter().map(|&b| b == 1).collect();
        let spans = analyze_spans(&mask);
        assert_eq!(spans.count, 2);
        assert_eq!(spans.longest, 3);
        assert!((spans.mean_duration - 2.5).abs() < 1e-12);
    }

    #[test]
    fn spans_handle_trailing_run_and_empty() {
        let spans = analyze_spans(&[false, true, true]);
        assert_eq!(spans.count, 1);
        assert_eq!(spans.longest, 2);

        let none = analyze_spans(&[false; 5]);
        assert_eq!(none.count, 0);
        assert_eq!(none.longest, 0);
        assert_eq!(none.mean_duration, 0.0);
    }

    #[test]
    fn hourly_finds_peak_hour() {
        let hours = [8.0, 8.0, 14.0, 14.0, 22.0, 22.0];
        let probs = [0.9, 0.8, 0.2, 0.1, 0.4, 0.5];
        let hourly = hourly_risk(&hours, &probs).unwrap();
        assert_eq!(hourly.peak_hour, 8);
        assert_eq!(hourly.lowest_hour, 14);
        assert!(hourly.variation > 0.0);
    }

    #[test]
    fn riskiest_decile_tracks_fast_driving() {
        let n = 100;
        let speeds: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let probs: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
        let profile = speed_risk_profile(&speeds, &probs).unwrap();
        assert!(profile.correlation > 0.99);
        assert_eq!(profile.riskiest_range, (90.0, 99.0));
    }

    #[test]
    fn report_shares_use_high_threshold() {
        let cfg = crate::config::RiskConfig::default();
        let probs = [0.1, 0.8, 0.9, 0.2];
        let report = analyze(&probs, &[9.0; 4], &[50.0; 4], &cfg);
        assert!((report.high_risk_share - 0.5).abs() < 1e-12);
        assert_eq!(report.spans.longest, 2);
    }
}
