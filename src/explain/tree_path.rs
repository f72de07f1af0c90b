//! Decision-path attribution: walking each tree, the change in expected
//! output at every split is credited to the split feature. Contributions
//! plus the base reconstruct the model margin exactly.

use super::{AdditiveExplainer, AttributionRecord};
use crate::model::gbdt::sigmoid;
use crate::model::GbdtClassifier;
use ndarray::ArrayView1;

pub struct PathAttributor<'a> {
    classifier: &'a GbdtClassifier,
}

impl<'a> PathAttributor<'a> {
    pub fn new(classifier: &'a GbdtClassifier) -> Self {
        Self { classifier }
    }
}

impl AdditiveExplainer for PathAttributor<'_> {
    fn attribute(&self, record_index: usize, row: ArrayView1<f64>) -> AttributionRecord {
        let lr = self.classifier.learning_rate();
        let mut contributions = vec![0.0; self.classifier.feature_count()];
        let mut base = self.classifier.base_score();

        for tree in self.classifier.trees() {
            let nodes = tree.nodes();
            base += lr * nodes[0].value;
            let mut cursor = 0usize;
            while !nodes[cursor].is_leaf {
                let node = &nodes[cursor];
                let next = if row[node.feature] <= node.threshold {
                    node.left
                } else {
                    node.right
                };
                contributions[node.feature] += lr * (nodes[next].value - node.value);
                cursor = next;
            }
        }

        let margin = base + contributions.iter().sum::<f64>();
        AttributionRecord {
            record_index,
            base,
            contributions,
            final_score: sigmoid(margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::model::TrainableClassifier;
    use ndarray::Array2;

    fn fixture() -> (GbdtClassifier, Array2<f64>) {
        let n = 80;
        let mut x = Array2::zeros((n, 3));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let hot = i % 4 == 0;
            x[[i, 0]] = if hot { 95.0 } else { 45.0 } + (i % 9) as f64;
            x[[i, 1]] = (i % 13) as f64;
            x[[i, 2]] = (i % 5) as f64 * 0.1;
            y.push(if hot { 1.0 } else { 0.0 });
        }
        let cfg = TrainingConfig {
            n_estimators: 25,
            min_samples_leaf: 2,
            max_depth: 3,
            ..TrainingConfig::default()
        };
        let (model, _) = GbdtClassifier::train(&x, &y, &x, &y, &cfg).unwrap();
        (model, x)
    }

    #[test]
    fn contributions_reconstruct_prediction() {
        let (model, x) = fixture();
        let attributor = PathAttributor::new(&model);
        for i in 0..x.nrows() {
            let record = attributor.attribute(i, x.row(i));
            let predicted = model.predict_probability(x.row(i));
            assert!(
                (record.final_score - predicted).abs() < 1e-9,
                "row {i}: {} vs {}",
                record.final_score,
                predicted
            );
        }
    }

    #[test]
    fn informative_feature_dominates() {
        let (model, x) = fixture();
        let attributor = PathAttributor::new(&model);
        let record = attributor.attribute(0, x.row(0));
        let dominant = record
            .contributions
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
            .map(|(i, _)| i);
        assert_eq!(dominant, Some(0));
    }
}
