//! Feature engineering: preprocessing, temporal statistics, smoothing, and
//! derived composites over a telemetry series.

pub mod derived;
pub mod frame;
pub mod preprocess;
pub mod smooth;
pub mod temporal;

pub use frame::FeatureFrame;
pub use preprocess::Preprocessor;
pub use temporal::TemporalFeatureEngine;
