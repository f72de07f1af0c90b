//! Gradient-boosted binary classifier: Newton boosting on logistic loss with
//! feature and row subsampling, early-stopped on validation log-loss over a
//! causally later slice of the series.

use super::tree::{RegressionTree, TreeParams};
use super::TrainableClassifier;
use crate::config::TrainingConfig;
use crate::error::{Result, RiskError};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const HESS_FLOOR: f64 = 1e-16;
const PROB_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtClassifier {
    trees: Vec<RegressionTree>,
    base_score: f64,
    learning_rate: f64,
    feature_count: usize,
    /// Total split gain per feature, aligned with the training layout.
    importance: Vec<f64>,
}

/// Metrics from one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_auc: Option<f64>,
    pub val_auc: Option<f64>,
    pub best_iteration: usize,
    pub trees: usize,
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

impl GbdtClassifier {
    /// Train on a causally split dataset: `(x_train, y_train)` precede
    /// `(x_val, y_val)` in time. Early stopping watches validation log-loss
    /// and the ensemble is truncated to the best round.
    pub fn train(
        x_train: &Array2<f64>,
        y_train: &[f64],
        x_val: &Array2<f64>,
        y_val: &[f64],
        config: &TrainingConfig,
    ) -> Result<(Self, TrainingReport)> {
        let n = x_train.nrows();
        let d = x_train.ncols();
        if n == 0 || d == 0 {
            return Err(RiskError::InvalidData("empty training matrix".into()));
        }
        let positives = y_train.iter().filter(|&&y| y > 0.5).count();
        if positives == 0 || positives == n {
            return Err(RiskError::InvalidData(
                "training labels contain a single class".into(),
            ));
        }

        let prior = (positives as f64 / n as f64).clamp(PROB_EPS, 1.0 - PROB_EPS);
        let base_score = (prior / (1.0 - prior)).ln();

        let mut model = Self {
            trees: Vec::new(),
            base_score,
            learning_rate: config.learning_rate,
            feature_count: d,
            importance: vec![0.0; d],
        };

        let mut rng = StdRng::seed_from_u64(config.seed);
        let tree_params = TreeParams {
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
        };
        let n_feature_sample = ((d as f64 * config.feature_fraction).ceil() as usize)
            .clamp(1, d);
        let n_row_sample = ((n as f64 * config.bagging_fraction) as usize).clamp(1, n);

        let mut margin_train = vec![base_score; n];
        let mut margin_val = vec![base_score; x_val.nrows()];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut bag: Vec<usize> = (0..n).collect();

        let mut best_loss = f64::INFINITY;
        let mut best_iteration = 0usize;
        let mut rounds_since_best = 0usize;

        for round in 0..config.n_estimators {
            for i in 0..n {
                let p = sigmoid(margin_train[i]);
                grad[i] = p - y_train[i];
                hess[i] = (p * (1.0 - p)).max(HESS_FLOOR);
            }

            if config.bagging_freq > 0
                && n_row_sample < n
                && round % config.bagging_freq == 0
            {
                bag = sample(&mut rng, n, n_row_sample).into_vec();
            }
            let features: Vec<usize> = if n_feature_sample < d {
                sample(&mut rng, d, n_feature_sample).into_vec()
            } else {
                (0..d).collect()
            };

            let tree = RegressionTree::fit(x_train, &grad, &hess, &bag, &features, &tree_params);

            for i in 0..n {
                margin_train[i] += config.learning_rate * tree.predict(x_train.row(i));
            }
            for (i, m) in margin_val.iter_mut().enumerate() {
                *m += config.learning_rate * tree.predict(x_val.row(i));
            }
            tree.accumulate_gain(&mut model.importance);
            model.trees.push(tree);

            // Early stopping on the causally later validation slice; fall
            // back to training loss when no validation rows exist.
            let loss = if margin_val.is_empty() {
                log_loss(&margin_train, y_train)
            } else {
                log_loss(&margin_val, y_val)
            };
            if loss < best_loss {
                best_loss = loss;
                best_iteration = round + 1;
                rounds_since_best = 0;
            } else {
                rounds_since_best += 1;
                if rounds_since_best >= config.early_stopping_rounds {
                    debug!(round, best_iteration, "early stopping");
                    break;
                }
            }
        }

        model.trees.truncate(best_iteration);
        // Importance must reflect only the kept rounds.
        model.importance = vec![0.0; d];
        for tree in &model.trees {
            tree.accumulate_gain(&mut model.importance);
        }

        let train_pred: Vec<f64> = (0..n)
            .map(|i| model.predict_probability(x_train.row(i)))
            .collect();
        let val_pred: Vec<f64> = (0..x_val.nrows())
            .map(|i| model.predict_probability(x_val.row(i)))
            .collect();
        let report = TrainingReport {
            train_auc: roc_auc(y_train, &train_pred),
            val_auc: roc_auc(y_val, &val_pred),
            best_iteration,
            trees: model.trees.len(),
        };

        info!(
            trees = report.trees,
            best_iteration,
            train_auc = report.train_auc.unwrap_or(f64::NAN),
            val_auc = report.val_auc.unwrap_or(f64::NAN),
            "classifier trained"
        );
        Ok((model, report))
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn importance(&self) -> &[f64] {
        &self.importance
    }
}

impl TrainableClassifier for GbdtClassifier {
    fn raw_score(&self, row: ArrayView1<f64>) -> f64 {
        self.base_score
            + self.learning_rate
                * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    fn predict_probability(&self, row: ArrayView1<f64>) -> f64 {
        sigmoid(self.raw_score(row))
    }
}

fn log_loss(margins: &[f64], labels: &[f64]) -> f64 {
    if margins.is_empty() {
        return f64::INFINITY;
    }
    margins
        .iter()
        .zip(labels)
        .map(|(&m, &y)| {
            let p = sigmoid(m).clamp(PROB_EPS, 1.0 - PROB_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / margins.len() as f64
}

/// Rank-based ROC-AUC; None when only one class is present.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Option<f64> {
    let n = labels.len();
    let pos = labels.iter().filter(|&&y| y > 0.5).count();
    let neg = n - pos;
    if pos == 0 || neg == 0 {
        return None;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap());

    // Average ranks across score ties.
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = avg;
        }
        i = j + 1;
    }
    let rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y > 0.5)
        .map(|(_, &r)| r)
        .sum();
    Some((rank_sum - pos as f64 * (pos as f64 + 1.0) / 2.0) / (pos as f64 * neg as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable_data(n: usize) -> (Array2<f64>, Vec<f64>) {
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let hot = i % 3 == 0;
            x[[i, 0]] = if hot { 100.0 + (i % 7) as f64 } else { 40.0 + (i % 7) as f64 };
            x[[i, 1]] = (i % 11) as f64;
            y.push(if hot { 1.0 } else { 0.0 });
        }
        (x, y)
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            n_estimators: 40,
            early_stopping_rounds: 40,
            min_samples_leaf: 2,
            max_depth: 3,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn learns_separable_classes() {
        let (x, y) = separable_data(120);
        let split = 90;
        let x_train = x.slice(ndarray::s![..split, ..]).to_owned();
        let x_val = x.slice(ndarray::s![split.., ..]).to_owned();
        let (model, report) =
            GbdtClassifier::train(&x_train, &y[..split], &x_val, &y[split..], &small_config())
                .unwrap();

        let hot = model.predict_probability(ndarray::arr1(&[105.0, 3.0]).view());
        let cold = model.predict_probability(ndarray::arr1(&[42.0, 3.0]).view());
        assert!(hot > 0.7, "hot={hot}");
        assert!(cold < 0.3, "cold={cold}");
        assert!(report.val_auc.unwrap() > 0.9);
    }

    #[test]
    fn single_class_labels_rejected() {
        let x = Array2::zeros((10, 2));
        let y = vec![0.0; 10];
        let err = GbdtClassifier::train(&x, &y, &x, &y, &small_config()).unwrap_err();
        assert!(matches!(err, RiskError::InvalidData(_)));
    }

    #[test]
    fn training_is_deterministic() {
        let (x, y) = separable_data(90);
        let cfg = small_config();
        let (a, _) = GbdtClassifier::train(&x, &y, &x, &y, &cfg).unwrap();
        let (b, _) = GbdtClassifier::train(&x, &y, &x, &y, &cfg).unwrap();
        let row = ndarray::arr1(&[60.0, 5.0]);
        assert_eq!(a.raw_score(row.view()), b.raw_score(row.view()));
    }

    #[test]
    fn auc_perfect_ranking_is_one() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &scores), Some(1.0));
        assert_eq!(roc_auc(&[1.0, 1.0], &[0.5, 0.6]), None);
    }
}
