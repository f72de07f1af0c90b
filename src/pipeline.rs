//! End-to-end orchestration: raw telemetry in, trained model and scored
//! series out. Training returns a [`TrainedRiskModel`]; scoring and
//! attribution only exist on that type, so an untrained pipeline cannot be
//! asked for predictions.

use crate::config::AnalyzerConfig;
use crate::error::{Result, RiskError};
use crate::explain::{
    aggregate, key_moments, summarize, AdditiveExplainer, AttributionRecord, AttributionSummary,
    FeatureImportance, KeyMoment, PathAttributor, RuleAssessment, RuleEngine,
};
use crate::features::frame::FeatureFrame;
use crate::features::{Preprocessor, TemporalFeatureEngine};
use crate::labeling::LabelPolicy;
use crate::model::{GbdtClassifier, ModelBundle, TrainableClassifier, TrainingReport};
use crate::risk::{patterns, PatternReport, RiskEngine, RiskResult};
use crate::select::FeatureSelector;
use crate::telemetry::{SeriesSchema, TelemetryRecord};
use ndarray::{s, Array2};
use std::path::Path;
use tracing::{debug, info};

pub struct RiskPipeline {
    config: AnalyzerConfig,
}

/// Everything the attribution side produces for one scored series.
#[derive(Debug, Clone)]
pub struct SeriesExplanation {
    pub attributions: Vec<AttributionRecord>,
    pub importance: Vec<FeatureImportance>,
    pub summary: AttributionSummary,
    pub moments: Vec<KeyMoment>,
    /// Model-independent rule cross-check, one assessment per record.
    pub rules: Vec<RuleAssessment>,
    pub patterns: PatternReport,
}

impl RiskPipeline {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnalyzerConfig::default())
    }

    /// Train on an ordered series. Labels come from `policy`; the
    /// validation slice is the trailing fraction of the series, so it is
    /// always causally later than the training slice.
    pub fn train(
        &self,
        records: &[TelemetryRecord],
        policy: LabelPolicy,
    ) -> Result<(TrainedRiskModel, TrainingReport)> {
        let (mut frame, schema) = Preprocessor::run(records)?;
        TemporalFeatureEngine::new(self.config.features.clone()).augment(&mut frame, &schema);
        debug!(
            records = frame.len(),
            features = frame.num_columns(),
            "feature engineering complete"
        );

        let labels = policy.label(&frame, &self.config.labeling);
        let flagged = labels.is_high_risk.iter().filter(|&&f| f).count();
        info!(flagged, total = frame.len(), "series labeled");

        let weather = weather_series(records, &schema);
        let selector = FeatureSelector::new(self.config.training.correlation_threshold);
        let (state, matrix) = selector.fit(&frame, weather.as_deref())?;

        let y: Vec<f64> = labels
            .is_high_risk
            .iter()
            .map(|&f| if f { 1.0 } else { 0.0 })
            .collect();

        let n = matrix.nrows();
        let val_len = (n as f64 * self.config.training.validation_split) as usize;
        let split = (n - val_len).max(1);
        let x_train = matrix.slice(s![..split, ..]).to_owned();
        let x_val = matrix.slice(s![split.., ..]).to_owned();

        let (classifier, report) = GbdtClassifier::train(
            &x_train,
            &y[..split],
            &x_val,
            &y[split..],
            &self.config.training,
        )?;

        let bundle = ModelBundle::new(
            classifier,
            state,
            self.config.features.clone(),
            self.config.risk.clone(),
        );
        Ok((TrainedRiskModel { bundle }, report))
    }
}

/// A fitted model. The only type in the crate that can score or explain.
#[derive(Debug)]
pub struct TrainedRiskModel {
    bundle: ModelBundle,
}

impl TrainedRiskModel {
    /// Wrap a loaded bundle. A bundle whose ensemble was truncated to zero
    /// rounds cannot score and is rejected here.
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        if bundle.classifier.trees().is_empty() {
            return Err(RiskError::NotTrained);
        }
        Ok(Self { bundle })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.bundle.save(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bundle(ModelBundle::load(path)?)
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn feature_names(&self) -> &[String] {
        &self.bundle.selector.layout
    }

    /// Score every record of an ordered series.
    pub fn score_series(&self, records: &[TelemetryRecord]) -> Result<Vec<RiskResult>> {
        let (matrix, _) = self.design_matrix(records)?;
        let engine = RiskEngine::new(self.bundle.risk.clone());
        Ok((0..matrix.nrows())
            .map(|i| {
                let p = self.bundle.classifier.predict_probability(matrix.row(i));
                engine.score(i, p)
            })
            .collect())
    }

    /// Score and decompose a series: per-record attributions, aggregate
    /// importance, key moments above the high threshold, and pattern
    /// analytics over the probability trace.
    pub fn explain_series(&self, records: &[TelemetryRecord]) -> Result<SeriesExplanation> {
        let (matrix, frame) = self.design_matrix(records)?;
        let probabilities: Vec<f64> = (0..matrix.nrows())
            .map(|i| self.bundle.classifier.predict_probability(matrix.row(i)))
            .collect();

        let attributor = PathAttributor::new(&self.bundle.classifier);
        let attributions: Vec<AttributionRecord> = (0..matrix.nrows())
            .map(|i| attributor.attribute(i, matrix.row(i)))
            .collect();

        let names = &self.bundle.selector.layout;
        let importance = aggregate(&attributions, names);
        let summary = summarize(&attributions)
            .ok_or_else(|| RiskError::InvalidData("no records to attribute".into()))?;
        let rules = records.iter().map(RuleEngine::assess).collect();
        let moments = key_moments(
            &attributions,
            &probabilities,
            matrix.view(),
            names,
            self.bundle.risk.high_threshold,
        );

        let hours = frame.column("hour").unwrap_or(&[]).to_vec();
        let speeds = frame.column("speed").unwrap_or(&[]).to_vec();
        let patterns = patterns::analyze(&probabilities, &hours, &speeds, &self.bundle.risk);

        Ok(SeriesExplanation {
            attributions,
            importance,
            summary,
            moments,
            rules,
            patterns,
        })
    }

    /// Rebuild the training-time feature layout for a fresh series.
    fn design_matrix(
        &self,
        records: &[TelemetryRecord],
    ) -> Result<(Array2<f64>, FeatureFrame)> {
        let (mut frame, schema) = Preprocessor::run(records)?;
        TemporalFeatureEngine::new(self.bundle.features.clone()).augment(&mut frame, &schema);
        let weather = weather_series(records, &schema);
        let matrix = self.bundle.selector.transform(&frame, weather.as_deref())?;
        Ok((matrix, frame))
    }
}

fn weather_series(
    records: &[TelemetryRecord],
    schema: &SeriesSchema,
) -> Option<Vec<Option<String>>> {
    if !schema.has_weather_category {
        return None;
    }
    Some(records.iter().map(|r| r.current_weather.clone()).collect())
}
