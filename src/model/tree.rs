//! Depth-limited regression tree over gradient/hessian targets — the weak
//! learner of the boosted ensemble. Every node stores the output it would
//! predict, so the attribution engine can walk decision paths and decompose
//! a score exactly.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// L2 regularization on leaf weights.
const LAMBDA: f64 = 1.0;
const MIN_GAIN: f64 = 1e-7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Split feature index; unused on leaves.
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    /// Output this node would predict (`-G/(H+λ)` over its cover).
    pub value: f64,
    /// Split gain; 0 on leaves.
    pub gain: f64,
    pub is_leaf: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl RegressionTree {
    /// Fit to negative-gradient targets with Newton leaf weights, restricted
    /// to the given rows and candidate features.
    pub fn fit(
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        features: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(x, grad, hess, rows, features, params, 0);
        tree
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        features: &[usize],
        params: &TreeParams,
        depth: usize,
    ) -> usize {
        let g: f64 = rows.iter().map(|&i| grad[i]).sum();
        let h: f64 = rows.iter().map(|&i| hess[i]).sum();
        let value = -g / (h + LAMBDA);

        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
            gain: 0.0,
            is_leaf: true,
        });

        if depth >= params.max_depth || rows.len() < 2 * params.min_samples_leaf {
            return index;
        }

        let Some(split) = best_split(x, grad, hess, rows, features, params, g, h) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);

        let left = self.build(x, grad, hess, &left_rows, features, params, depth + 1);
        let right = self.build(x, grad, hess, &right_rows, features, params, depth + 1);

        let node = &mut self.nodes[index];
        node.feature = split.feature;
        node.threshold = split.threshold;
        node.left = left;
        node.right = right;
        node.gain = split.gain;
        node.is_leaf = false;
        index
    }

    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.nodes[0];
        while !node.is_leaf {
            node = if row[node.feature] <= node.threshold {
                &self.nodes[node.left]
            } else {
                &self.nodes[node.right]
            };
        }
        node.value
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Accumulate split gains into a per-feature importance buffer.
    pub fn accumulate_gain(&self, importance: &mut [f64]) {
        for node in &self.nodes {
            if !node.is_leaf {
                importance[node.feature] += node.gain;
            }
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn score(g: f64, h: f64) -> f64 {
    g * g / (h + LAMBDA)
}

/// Exact greedy split search over sorted feature values.
#[allow(clippy::too_many_arguments)]
fn best_split(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    features: &[usize],
    params: &TreeParams,
    g_total: f64,
    h_total: f64,
) -> Option<Split> {
    let parent_score = score(g_total, h_total);
    let mut best: Option<Split> = None;

    for &f in features {
        let mut order: Vec<usize> = rows.to_vec();
        order.sort_by(|&a, &b| x[[a, f]].partial_cmp(&x[[b, f]]).unwrap());

        let mut g_left = 0.0;
        let mut h_left = 0.0;
        for k in 0..order.len() - 1 {
            let i = order[k];
            g_left += grad[i];
            h_left += hess[i];

            // Only split between distinct values.
            let v = x[[i, f]];
            let v_next = x[[order[k + 1], f]];
            if v == v_next {
                continue;
            }
            let n_left = k + 1;
            let n_right = order.len() - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }

            let gain = 0.5
                * (score(g_left, h_left) + score(g_total - g_left, h_total - h_left)
                    - parent_score);
            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature: f,
                    threshold: (v + v_next) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}
