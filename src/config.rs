//! Analyzer configuration. Defaults carry the tuned constants of the
//! production risk model; overriding them changes scoring semantics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Temporal feature engineering parameters
    pub features: FeaturesConfig,
    /// Risk label construction
    pub labeling: LabelingConfig,
    /// Classifier training parameters
    pub training: TrainingConfig,
    /// Probability → category thresholds
    pub risk: RiskConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Rolling window sizes, in samples
    pub windows: Vec<usize>,
    /// Lag offsets, in samples
    pub lags: Vec<usize>,
    /// Upper bound on the centered smoothing window (forced odd)
    pub smooth_window_cap: usize,
    /// Quantile defining the biometric high-stress flag
    pub stress_quantile: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Percentile of the composite score above which records are high risk
    pub high_risk_percentile: f64,
    /// Composite score cut points for low/medium/high levels
    pub level_cuts: (f64, f64),
    /// Expected outlier fraction for the anomaly policy
    pub contamination: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to each tree
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Fraction of features sampled per tree
    pub feature_fraction: f64,
    /// Fraction of rows sampled when bagging
    pub bagging_fraction: f64,
    /// Re-draw the bagging sample every this many trees (0 disables bagging)
    pub bagging_freq: usize,
    /// Stop after this many rounds without validation improvement
    pub early_stopping_rounds: usize,
    /// Trailing fraction of the series held out for validation
    pub validation_split: f64,
    /// Pairwise |correlation| above which one feature is pruned
    pub correlation_threshold: f64,
    /// RNG seed for subsampling
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Probability at or above this is at least medium risk
    pub medium_threshold: f64,
    /// Probability below this is medium risk; at or above is high
    pub high_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            features: FeaturesConfig::default(),
            labeling: LabelingConfig::default(),
            training: TrainingConfig::default(),
            risk: RiskConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            windows: vec![5, 10, 30, 60],
            lags: vec![1, 5, 10],
            smooth_window_cap: 11,
            stress_quantile: 0.8,
        }
    }
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            high_risk_percentile: 85.0,
            level_cuts: (2.0, 5.0),
            contamination: 0.1,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.05,
            max_depth: 6,
            min_samples_leaf: 20,
            feature_fraction: 0.8,
            bagging_fraction: 0.8,
            bagging_freq: 5,
            early_stopping_rounds: 50,
            validation_split: 0.2,
            correlation_threshold: 0.95,
            seed: 42,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            medium_threshold: 0.3,
            high_threshold: 0.7,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AnalyzerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AnalyzerConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
