//! Gradient-boosted risk classifier and its persistence format.

pub mod bundle;
pub mod gbdt;
pub mod tree;

pub use bundle::ModelBundle;
pub use gbdt::{GbdtClassifier, TrainingReport};
pub use tree::RegressionTree;

use ndarray::ArrayView1;

/// A fitted binary classifier scoring one feature row at a time.
pub trait TrainableClassifier {
    /// Additive margin (log-odds) before the sigmoid.
    fn raw_score(&self, row: ArrayView1<f64>) -> f64;

    /// Probability of the high-risk class.
    fn predict_probability(&self, row: ArrayView1<f64>) -> f64;
}
