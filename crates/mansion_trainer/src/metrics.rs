//! Held-out regression metrics

use serde::{Deserialize, Serialize};

/// Guards the MAPE denominator against zero targets.
pub const MAPE_EPSILON: f64 = f64::EPSILON;

/// Evaluation summary stored in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Percent
    pub mape: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// All four metrics; empty input yields zeros.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());
        Self {
            rmse: mse(y_true, y_pred).sqrt(),
            mae: mae(y_true, y_pred),
            mape: mape(y_true, y_pred),
            r2: r2(y_true, y_pred),
        }
    }
}

/// Mean squared error: mean((y - ŷ)²)
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Mean absolute error: mean(|y - ŷ|)
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum::<f64>() / y_true.len() as f64
}

/// Mean absolute percentage error in percent:
/// `100 · mean(|y - ŷ| / max(|y|, ε))`
pub fn mape(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs() / t.abs().max(MAPE_EPSILON))
        .sum();
    100.0 * sum / y_true.len() as f64
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target has no variance to explain: 1.0 for a perfect fit,
/// 0.0 otherwise.
pub fn r2(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p) * (t - p)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
