//! Error taxonomy for the risk pipeline. Recoverable conditions (missing
//! optional signals, degenerate series) are handled locally and never reach
//! this enum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("telemetry series is empty")]
    EmptySeries,

    #[error("model not trained")]
    NotTrained,

    #[error("feature schema mismatch: expected column '{expected}', found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("unseen category '{value}' for feature '{feature}'")]
    UnseenCategory { feature: String, value: String },

    #[error("invalid training data: {0}")]
    InvalidData(String),

    #[error("model bundle corrupt: {0}")]
    Bundle(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RiskError>;
