//! driverisk — Driving-risk scoring over vehicle telemetry series.
//!
//! Modular structure:
//! - [`telemetry`] — Input record schema and capability resolution
//! - [`features`] — Preprocessing, temporal statistics, smoothing, derived composites
//! - [`labeling`] — Composite / threshold / anomaly risk labeling policies
//! - [`select`] — Feature layout: encoding, imputation, correlation pruning
//! - [`model`] — Gradient-boosted classifier and checksummed persistence
//! - [`risk`] — Probability-to-category mapping and pattern analytics
//! - [`explain`] — Additive attribution and rule-based cross-checks
//! - [`pipeline`] — End-to-end training and scoring orchestration
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod explain;
pub mod features;
pub mod labeling;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod risk;
pub mod select;
pub mod telemetry;

pub use config::AnalyzerConfig;
pub use error::{Result, RiskError};
pub use explain::{AttributionRecord, AttributionSummary, FeatureImportance, KeyMoment};
pub use features::{FeatureFrame, Preprocessor, TemporalFeatureEngine};
pub use labeling::{LabelPolicy, RiskLabels};
pub use logging::StructuredLogger;
pub use model::{ModelBundle, TrainingReport};
pub use pipeline::{RiskPipeline, SeriesExplanation, TrainedRiskModel};
pub use risk::{RiskEngine, RiskLevel, RiskResult};
pub use select::FeatureSelector;
pub use telemetry::TelemetryRecord;
