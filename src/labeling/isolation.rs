//! Isolation forest for the anomaly labeling policy. Outliers isolate in
//! fewer random splits than inliers; the contamination fraction sets the
//! score cut. Seeded, so labels are reproducible run to run.

use crate::features::frame::percentile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_TREES: usize = 100;
const MAX_SUBSAMPLE: usize = 256;
const SEED: u64 = 42;

enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

pub struct IsolationForest {
    trees: Vec<Node>,
    subsample: usize,
    threshold: f64,
}

impl IsolationForest {
    /// Fit on row-major data and fix the score threshold so roughly
    /// `contamination` of the training rows land above it.
    pub fn fit(rows: &[Vec<f64>], contamination: f64) -> Self {
        let n = rows.len();
        let subsample = n.min(MAX_SUBSAMPLE);
        let height_limit = (subsample as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(SEED);

        let trees: Vec<Node> = (0..N_TREES)
            .map(|_| {
                let sample: Vec<usize> = (0..subsample).map(|_| rng.gen_range(0..n)).collect();
                build_tree(rows, &sample, 0, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            subsample,
            threshold: 0.0,
        };
        let scores: Vec<f64> = rows.iter().map(|r| forest.score(r)).collect();
        forest.threshold = percentile(&scores, (1.0 - contamination) * 100.0);
        forest
    }

    /// Anomaly score in (0, 1]; higher isolates faster.
    pub fn score(&self, row: &[f64]) -> f64 {
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|t| path_length(t, row, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / avg_path(self.subsample))
    }

    pub fn outliers(&self, rows: &[Vec<f64>]) -> Vec<bool> {
        rows.iter().map(|r| self.score(r) > self.threshold).collect()
    }
}

fn build_tree(
    rows: &[Vec<f64>],
    sample: &[usize],
    depth: usize,
    limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= limit || sample.len() <= 1 {
        return Node::Leaf { size: sample.len() };
    }
    let dim = rows[sample[0]].len();
    let feature = rng.gen_range(0..dim);
    let (mut lo, mut hi) = (f64::MAX, f64::MIN);
    for &i in sample {
        lo = lo.min(rows[i][feature]);
        hi = hi.max(rows[i][feature]);
    }
    if lo >= hi {
        return Node::Leaf { size: sample.len() };
    }
    let value = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        sample.iter().partition(|&&i| rows[i][feature] < value);
    Node::Split {
        feature,
        value,
        left: Box::new(build_tree(rows, &left, depth + 1, limit, rng)),
        right: Box::new(build_tree(rows, &right, depth + 1, limit, rng)),
    }
}

fn path_length(node: &Node, row: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + avg_path(*size),
        Node::Split {
            feature,
            value,
            left,
            right,
        } => {
            if row[*feature] < *value {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points; the
/// standard normalizer for isolation forests.
fn avg_path(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let h = (n as f64 - 1.0).ln() + 0.577_215_664_901_532_9;
    2.0 * h - 2.0 * (n as f64 - 1.0) / n as f64
}
