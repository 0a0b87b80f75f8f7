//! Model registry
//!
//! Maps a model name to its constructor, default hyperparameters and search
//! grid. Fitted models share the [`Regressor`] interface.

use mansion_core::{GbdtModel, MansionError, Matrix, Result};
use serde::{Deserialize, Serialize};

use crate::gbdt::{GbdtParams, GbdtTrainer};

/// Registered model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 1] = [ModelKind::GradientBoosting];

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| MansionError::Configuration(format!("unknown model: {}", name)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    pub fn default_params(&self) -> ModelParams {
        match self {
            ModelKind::GradientBoosting => ModelParams::GradientBoosting(GbdtParams::default()),
        }
    }

    pub fn param_grid(&self) -> ParamGrid {
        match self {
            ModelKind::GradientBoosting => ParamGrid::default(),
        }
    }
}

/// Hyperparameters of one model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParams {
    GradientBoosting(GbdtParams),
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    /// Fit on `rows` of `x` (all rows when `None`).
    pub fn fit(&self, x: &Matrix, y: &[f64], rows: Option<&[usize]>) -> Result<FittedModel> {
        match self {
            ModelParams::GradientBoosting(p) => Ok(FittedModel::GradientBoosting(
                GbdtTrainer::new(p.clone()).fit(x, y, rows)?,
            )),
        }
    }
}

/// Cartesian search grid over boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub learning_rate: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![3, 5, 7],
            learning_rate: vec![0.05, 0.1],
        }
    }
}

impl ParamGrid {
    /// Candidates ordered by parameter name (learning_rate, max_depth,
    /// n_estimators) with the last name varying fastest.
    pub fn candidates(&self) -> Vec<ModelParams> {
        let mut out = Vec::with_capacity(self.len());
        for &learning_rate in &self.learning_rate {
            for &max_depth in &self.max_depth {
                for &n_estimators in &self.n_estimators {
                    out.push(ModelParams::GradientBoosting(GbdtParams {
                        n_estimators,
                        max_depth,
                        learning_rate,
                        ..GbdtParams::default()
                    }));
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.max_depth.len() * self.learning_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inference interface shared by fitted models
pub trait Regressor {
    fn n_features(&self) -> usize;

    fn predict_row(&self, features: &[f64]) -> Result<f64>;

    /// Normalized importance per input column.
    fn feature_importances(&self) -> Vec<f64>;

    fn predict(&self, x: &Matrix) -> Result<Vec<f64>> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }
}

impl Regressor for GbdtModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64> {
        GbdtModel::predict_row(self, features)
    }

    fn feature_importances(&self) -> Vec<f64> {
        GbdtModel::feature_importances(self)
    }
}

/// A trained model of any registered family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    GradientBoosting(GbdtModel),
}

impl FittedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FittedModel::GradientBoosting(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            FittedModel::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for FittedModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64> {
        self.inner().predict_row(features)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.inner().feature_importances()
    }
}
