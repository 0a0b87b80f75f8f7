//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression trees on squared error. Every distinct value of
//! every feature is a candidate; thresholds sit halfway between neighbouring
//! values. Equal gains resolve through [`SplitTieBreaker`].

use mansion_core::{Matrix, Node};

use crate::deterministic::SplitTieBreaker;

/// Growth limits for a single tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    threshold: f64,
    gain: f64,
    left_len: usize,
    order: Vec<usize>,
    tie_breaker: SplitTieBreaker,
}

/// Builds one regression tree over a subset of matrix rows.
pub struct CartBuilder<'a> {
    features: &'a Matrix,
    targets: &'a [f64],
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    /// `targets` is indexed by matrix row.
    pub fn new(features: &'a Matrix, targets: &'a [f64], config: TreeConfig) -> Self {
        debug_assert_eq!(features.n_rows(), targets.len());
        Self {
            features,
            targets,
            config,
        }
    }

    /// Build the tree for `rows`, returning its nodes in pre-order.
    pub fn build(&self, rows: &[usize]) -> Vec<Node> {
        let mut nodes = Vec::new();
        self.build_node(rows.to_vec(), 0, &mut nodes);
        nodes
    }

    fn build_node(&self, rows: Vec<usize>, depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current = nodes.len();
        let leaf_value = self.mean(&rows);

        let min_leaf = self.config.min_samples_leaf.max(1);
        if depth >= self.config.max_depth
            || rows.len() < self.config.min_samples_split.max(2)
            || rows.len() < 2 * min_leaf
        {
            nodes.push(Node::leaf(leaf_value));
            return current as i32;
        }

        let Some(split) = self.find_best_split(&rows) else {
            nodes.push(Node::leaf(leaf_value));
            return current as i32;
        };

        nodes.push(Node::internal(
            split.tie_breaker.feature_idx,
            split.threshold,
            -1,
            -1,
            split.gain,
        ));

        let mut left = split.order;
        let right = left.split_off(split.left_len);
        let left_idx = self.build_node(left, depth + 1, nodes);
        let right_idx = self.build_node(right, depth + 1, nodes);

        nodes[current].left = left_idx;
        nodes[current].right = right_idx;
        current as i32
    }

    /// Best split by squared-error reduction
    /// `G_L²/n_L + G_R²/n_R − G²/n`; `None` when nothing improves.
    fn find_best_split(&self, rows: &[usize]) -> Option<SplitCandidate> {
        let n = rows.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let total: f64 = rows.iter().map(|&r| self.targets[r]).sum();
        let parent_score = total * total / n as f64;

        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.features.n_cols() {
            let mut order = rows.to_vec();
            order.sort_by(|&a, &b| {
                self.features
                    .get(a, feature_idx)
                    .total_cmp(&self.features.get(b, feature_idx))
                    .then(a.cmp(&b))
            });

            let mut left_sum = 0.0;
            let mut feature_best: Option<(f64, f64, usize)> = None;

            for i in 0..n - 1 {
                left_sum += self.targets[order[i]];
                let left_len = i + 1;
                let right_len = n - left_len;
                if left_len < min_leaf || right_len < min_leaf {
                    continue;
                }

                let lo = self.features.get(order[i], feature_idx);
                let hi = self.features.get(order[i + 1], feature_idx);
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / left_len as f64
                    + right_sum * right_sum / right_len as f64
                    - parent_score;
                if !gain.is_finite() || gain <= 0.0 {
                    continue;
                }

                // the midpoint can round up onto `hi` for adjacent floats
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };

                let better = match feature_best {
                    None => true,
                    Some((g, t, _)) => {
                        gain > g || (gain == g && threshold.total_cmp(&t).is_lt())
                    }
                };
                if better {
                    feature_best = Some((gain, threshold, left_len));
                }
            }

            let Some((gain, threshold, left_len)) = feature_best else {
                continue;
            };
            let candidate = SplitCandidate {
                threshold,
                gain,
                left_len,
                order,
                tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
            };

            best = match best {
                None => Some(candidate),
                Some(current) => {
                    if candidate.gain > current.gain
                        || (candidate.gain == current.gain
                            && candidate.tie_breaker.compare(&current.tie_breaker).is_lt())
                    {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        best
    }

    fn mean(&self, rows: &[usize]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        rows.iter().map(|&r| self.targets[r]).sum::<f64>() / rows.len() as f64
    }
}
