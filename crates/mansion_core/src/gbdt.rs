//! Gradient-boosted regression trees: representation and inference
//!
//! Trees are flat node arrays with the root at index 0. Internal nodes send
//! a sample left when `feature <= threshold`.

use crate::errors::{MansionError, Result};
use serde::{Deserialize, Serialize};

/// A tree node (internal or leaf)
///
/// Leaves carry `feature_idx == -1` and a `leaf` value; internal nodes carry
/// child indices and the squared-error reduction their split achieved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    pub threshold: f64,
    pub leaf: Option<f64>,
    #[serde(default)]
    pub gain: f64,
}

impl Node {
    pub fn internal(feature_idx: usize, threshold: f64, left: i32, right: i32, gain: f64) -> Self {
        Self {
            left,
            right,
            feature_idx: feature_idx as i32,
            threshold,
            leaf: None,
            gain,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
            gain: 0.0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx < 0 || self.leaf.is_some()
    }
}

/// One regression tree plus its shrinkage weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw leaf value reached by `features`; malformed trees yield 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }
            let Some(value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };
            let next = if *value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(n) if !n.is_leaf() => {
                    1 + walk(nodes, n.left as usize).max(walk(nodes, n.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    _ => return Err(format!("leaf {} has no finite value", i)),
                }
                continue;
            }
            for child in [node.left, node.right] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("node {} has invalid child {}", i, child));
                }
            }
            if node.feature_idx as usize >= n_features {
                return Err(format!(
                    "node {} splits on feature {} of {}",
                    i, node.feature_idx, n_features
                ));
            }
            if !node.threshold.is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
        }
        Ok(())
    }
}

/// Additive tree ensemble: `bias + Σ weight · tree(x)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    pub bias: f64,
    pub trees: Vec<Tree>,
    pub n_features: usize,
}

impl GbdtModel {
    pub fn new(bias: f64, trees: Vec<Tree>, n_features: usize) -> Self {
        Self {
            bias,
            trees,
            n_features,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bias.is_finite() {
            return Err(MansionError::Configuration("model bias is not finite".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| {
                MansionError::Configuration(format!("tree {} is invalid: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Predict one row.
    pub fn predict_row(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(MansionError::ShapeMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        Ok(self
            .trees
            .iter()
            .fold(self.bias, |acc, t| acc + t.weight * t.evaluate(features)))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Split-gain importance per feature, normalized to sum to 1.
    ///
    /// All zeros when no split was ever made.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for node in self.trees.iter().flat_map(|t| &t.nodes) {
            if !node.is_leaf() {
                if let Some(slot) = totals.get_mut(node.feature_idx as usize) {
                    *slot += node.gain.max(0.0);
                }
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64, gain: f64) -> Tree {
        Tree::new(
            vec![
                Node::internal(feature, threshold, 1, 2, gain),
                Node::leaf(left),
                Node::leaf(right),
            ],
            0.5,
        )
    }

    #[test]
    fn equal_goes_left() {
        let tree = stump(0, 50.0, 100.0, 200.0, 1.0);
        assert_eq!(tree.evaluate(&[30.0]), 100.0);
        assert_eq!(tree.evaluate(&[50.0]), 100.0);
        assert_eq!(tree.evaluate(&[60.0]), 200.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn model_prediction_sums_weighted_trees() {
        let model = GbdtModel::new(
            10.0,
            vec![stump(0, 0.0, -2.0, 2.0, 3.0), stump(1, 0.0, -4.0, 4.0, 1.0)],
            2,
        );
        assert!(model.validate().is_ok());
        assert_eq!(model.predict_row(&[1.0, -1.0]).unwrap(), 10.0 + 1.0 - 2.0);
        assert!(matches!(
            model.predict_row(&[1.0]),
            Err(MansionError::ShapeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn importances_are_normalized_gain() {
        let model = GbdtModel::new(
            0.0,
            vec![stump(0, 0.0, -1.0, 1.0, 3.0), stump(1, 0.0, -1.0, 1.0, 1.0)],
            3,
        );
        assert_eq!(model.feature_importances(), vec![0.75, 0.25, 0.0]);

        let flat = GbdtModel::new(1.0, vec![Tree::new(vec![Node::leaf(0.0)], 0.1)], 2);
        assert_eq!(flat.feature_importances(), vec![0.0, 0.0]);
    }

    #[test]
    fn validation_rejects_bad_structure() {
        let bad_child = Tree::new(
            vec![Node::internal(0, 1.0, 5, 2, 0.0), Node::leaf(1.0), Node::leaf(2.0)],
            1.0,
        );
        assert!(bad_child.validate(1).is_err());

        let bad_feature = stump(3, 0.0, 1.0, 2.0, 0.0);
        assert!(bad_feature.validate(2).is_err());

        let model = GbdtModel::new(0.0, vec![bad_feature], 2);
        assert!(matches!(model.validate(), Err(MansionError::Configuration(_))));
    }
}
