//! CART regression tree (squared-error splits).
//!
//! Nodes live in a flat arena; children are indices into `nodes`.

use std::cmp::Ordering;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Fit on the rows of `inputs` selected by `sample` (repeats allowed).
    ///
    /// Returns `None` when `sample` is empty.
    pub fn fit(
        inputs: &[Vec<f64>],
        targets: &[f64],
        sample: &[usize],
        config: &TreeConfig,
    ) -> Option<Self> {
        if sample.is_empty() {
            return None;
        }
        let mut tree = Self { nodes: Vec::new() };
        let mut rows = sample.to_vec();
        tree.grow(inputs, targets, &mut rows, 0, config);
        Some(tree)
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    fn grow(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[f64],
        rows: &mut [usize],
        depth: usize,
        config: &TreeConfig,
    ) -> usize {
        let idx = self.nodes.len();
        let mean = rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64;
        self.nodes.push(Node::Leaf { value: mean });

        let depth_exhausted = config.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted || rows.len() < config.min_samples_split.max(2) {
            return idx;
        }

        let node_sse: f64 = rows.iter().map(|&r| (targets[r] - mean).powi(2)).sum();
        if node_sse <= 1e-12 * rows.len() as f64 {
            return idx;
        }

        let Some(best) = best_split(inputs, targets, rows, config.min_samples_leaf.max(1)) else {
            return idx;
        };
        if best.sse >= node_sse {
            return idx;
        }

        // Partition in place: left rows first.
        let mut boundary = 0;
        for i in 0..rows.len() {
            if inputs[rows[i]][best.feature] <= best.threshold {
                rows.swap(i, boundary);
                boundary += 1;
            }
        }
        if boundary == 0 || boundary == rows.len() {
            return idx;
        }

        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(inputs, targets, left_rows, depth + 1, config);
        let right = self.grow(inputs, targets, right_rows, depth + 1, config);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }
}

/// Lowest total child SSE over every feature and every distinct cut point.
fn best_split(
    inputs: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let n_features = inputs[rows[0]].len();
    let total_sum: f64 = rows.iter().map(|&r| targets[r]).sum();
    let total_sq: f64 = rows.iter().map(|&r| targets[r] * targets[r]).sum();

    let mut best: Option<SplitCandidate> = None;
    let mut order = rows.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| {
            inputs[a][feature]
                .partial_cmp(&inputs[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let y = targets[order[k]];
            left_sum += y;
            left_sq += y * y;

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let here = inputs[order[k]][feature];
            let next = inputs[order[k + 1]][feature];
            if next <= here {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_function_is_learned_exactly() {
        let inputs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let sample: Vec<usize> = (0..20).collect();
        let tree = RegressionTree::fit(&inputs, &targets, &sample, &TreeConfig::default()).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&[3.0]), 1.0);
        assert_eq!(tree.predict(&[15.0]), 5.0);
        assert_eq!(tree.predict(&[9.4]), 1.0);
        assert_eq!(tree.predict(&[9.6]), 5.0);
    }

    #[test]
    fn constant_targets_give_single_leaf() {
        let inputs: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, (i * 2) as f64]).collect();
        let targets = vec![7.0; 10];
        let sample: Vec<usize> = (0..10).collect();
        let tree = RegressionTree::fit(&inputs, &targets, &sample, &TreeConfig::default()).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(&[100.0, -3.0]), 7.0);
    }

    #[test]
    fn max_depth_limits_growth() {
        let inputs: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let sample: Vec<usize> = (0..32).collect();
        let config = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        let tree = RegressionTree::fit(&inputs, &targets, &sample, &config).unwrap();
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn empty_sample_has_no_tree() {
        assert!(RegressionTree::fit(&[], &[], &[], &TreeConfig::default()).is_none());
    }
}
