//! Gradient boosting on squared error
//!
//! Starts from the target mean and fits each tree to the current residuals;
//! the learning rate is stored as the tree weight, so inference is
//! `bias + Σ lr · leaf`.

use mansion_core::{GbdtModel, MansionError, Matrix, Result, Tree};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::{CartBuilder, TreeConfig};

/// Boosting hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl GbdtParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(MansionError::Configuration(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.n_estimators == 0 {
            return Err(MansionError::Configuration(
                "n_estimators must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Boosted-tree fitter
pub struct GbdtTrainer {
    params: GbdtParams,
}

impl GbdtTrainer {
    pub fn new(params: GbdtParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    /// Fit on the rows of `x` listed in `rows` (all rows when `None`).
    pub fn fit(&self, x: &Matrix, y: &[f64], rows: Option<&[usize]>) -> Result<GbdtModel> {
        self.params.validate()?;
        if x.n_rows() != y.len() {
            return Err(MansionError::ShapeMismatch {
                expected: x.n_rows(),
                actual: y.len(),
            });
        }

        let all: Vec<usize>;
        let rows = match rows {
            Some(r) => r,
            None => {
                all = (0..x.n_rows()).collect();
                &all
            }
        };
        if rows.is_empty() {
            return Err(MansionError::Data("cannot fit on zero rows".into()));
        }

        let bias = rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64;

        // residuals are indexed by matrix row; rows outside the subset stay 0
        let mut prediction = vec![bias; x.n_rows()];
        let mut residuals = vec![0.0; x.n_rows()];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let lr = self.params.learning_rate;

        for round in 0..self.params.n_estimators {
            for &r in rows {
                residuals[r] = y[r] - prediction[r];
            }

            let nodes = CartBuilder::new(x, &residuals, self.params.tree_config()).build(rows);
            let tree = Tree::new(nodes, lr);

            for &r in rows {
                prediction[r] += lr * tree.evaluate(x.row(r));
            }

            if round % 50 == 0 {
                debug!(round, nodes = tree.nodes.len(), "Boosting round");
            }
            trees.push(tree);
        }

        Ok(GbdtModel::new(bias, trees, x.n_cols()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Matrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y = (0..n).map(|i| 3.0 * i as f64 + 5.0).collect();
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn bias_is_target_mean() {
        let (x, y) = linear_data(4);
        let params = GbdtParams {
            n_estimators: 1,
            ..GbdtParams::default()
        };
        let model = GbdtTrainer::new(params).fit(&x, &y, None).unwrap();
        assert_eq!(model.bias, (5.0 + 8.0 + 11.0 + 14.0) / 4.0);
        assert_eq!(model.trees[0].weight, 0.1);
    }

    #[test]
    fn boosting_reduces_training_error() {
        let (x, y) = linear_data(40);
        let sse = |model: &GbdtModel| -> f64 {
            (0..x.n_rows())
                .map(|i| (model.predict_row(x.row(i)).unwrap() - y[i]).powi(2))
                .sum()
        };

        let few = GbdtTrainer::new(GbdtParams {
            n_estimators: 5,
            ..GbdtParams::default()
        })
        .fit(&x, &y, None)
        .unwrap();
        let many = GbdtTrainer::new(GbdtParams::default()).fit(&x, &y, None).unwrap();

        assert!(sse(&many) < sse(&few));
        assert!(many.validate().is_ok());
    }

    #[test]
    fn training_is_deterministic() {
        let (x, y) = linear_data(30);
        let a = GbdtTrainer::new(GbdtParams::default()).fit(&x, &y, None).unwrap();
        let b = GbdtTrainer::new(GbdtParams::default()).fit(&x, &y, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn subset_ignores_other_rows() {
        let (x, mut y) = linear_data(10);
        let rows: Vec<usize> = (0..5).collect();
        let a = GbdtTrainer::new(GbdtParams::default()).fit(&x, &y, Some(&rows)).unwrap();

        y[9] = 1e9;
        let b = GbdtTrainer::new(GbdtParams::default()).fit(&x, &y, Some(&rows)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_params() {
        let (x, y) = linear_data(5);
        let zero_lr = GbdtParams {
            learning_rate: 0.0,
            ..GbdtParams::default()
        };
        assert!(matches!(
            GbdtTrainer::new(zero_lr).fit(&x, &y, None),
            Err(MansionError::Configuration(_))
        ));
        assert!(matches!(
            GbdtTrainer::new(GbdtParams::default()).fit(&x, &y[..3], None),
            Err(MansionError::ShapeMismatch { .. })
        ));
    }
}
