//! Feature engineering
//!
//! Turns a [`Frame`] into the dense matrix the regressor consumes: derived
//! columns, imputation, z-score scaling of the numeric block and one-hot
//! encoding of the categorical block. The column layout is fixed by
//! `fit_transform` and reused verbatim by every later `transform`, which is
//! what keeps training rows and prediction rows comparable.

use crate::errors::{MansionError, Result};
use crate::frame::{Frame, TransactionRow, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Label substituted for missing categorical values
pub const MISSING_CATEGORY: &str = "Unknown";

/// Stations within this many minutes count as near.
pub const NEAR_STATION_MINUTES: f64 = 5.0;

/// Derived columns, in the order they are appended when enabled.
pub const DERIVED_COLUMNS: [&str; 4] = [
    "rooms_per_area",
    "building_age_squared",
    "is_near_station",
    "location_premium",
];

/// Values derived from a raw row before imputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub rooms_per_area: Option<f64>,
    pub building_age_squared: Option<f64>,
    pub is_near_station: f64,
    pub location_premium: Option<f64>,
}

impl DerivedFeatures {
    pub fn from_row(row: &TransactionRow) -> Self {
        let area = row.numeric("area_sqm");
        let rooms = row.numeric("num_rooms");
        let age = row.numeric("building_age");
        let minutes = row.numeric("time_to_station_min");
        let city = row.numeric("city_avg_price_per_sqm");
        let station = row.numeric("station_avg_price_per_sqm");

        let rooms_per_area = match (rooms, area) {
            (Some(r), Some(a)) if a != 0.0 => Some(r / a),
            _ => None,
        };

        Self {
            rooms_per_area,
            building_age_squared: age.map(|a| a * a),
            // an unknown walking time is never "near"
            is_near_station: match minutes {
                Some(m) if m <= NEAR_STATION_MINUTES => 1.0,
                _ => 0.0,
            },
            location_premium: station.zip(city).map(|(s, c)| s - c),
        }
    }

    fn get(&self, column: &str) -> Option<f64> {
        match column {
            "rooms_per_area" => self.rooms_per_area,
            "building_age_squared" => self.building_age_squared,
            "is_near_station" => Some(self.is_near_station),
            "location_premium" => self.location_premium,
            _ => None,
        }
    }
}

/// Options fixed when the engineer is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureEngineerConfig {
    /// Append [`DERIVED_COLUMNS`] to the numeric block.
    pub include_derived: bool,
}

/// Z-score scaler with population standard deviation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on column-major data. Constant columns get scale 1.
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let mut mean = Vec::with_capacity(columns.len());
        let mut scale = Vec::with_capacity(columns.len());

        for col in columns {
            if col.is_empty() {
                mean.push(0.0);
                scale.push(1.0);
                continue;
            }
            let n = col.len() as f64;
            let m = col.iter().sum::<f64>() / n;
            let var = col.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
            let constant = col.iter().all(|v| *v == col[0]);
            let std = var.sqrt();

            mean.push(m);
            scale.push(if constant || !std.is_finite() || std == 0.0 {
                1.0
            } else {
                std
            });
        }

        Self { mean, scale }
    }

    pub fn apply(&self, col: usize, value: f64) -> f64 {
        (value - self.mean[col]) / self.scale[col]
    }
}

/// One-hot encoder over sorted string categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OneHotEncoder {
    pub columns: Vec<String>,
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[&str], values: &[Vec<String>]) -> Self {
        let categories = values
            .iter()
            .map(|col| {
                col.iter()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .collect();
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            categories,
        }
    }

    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// `{column}_{category}` for every indicator, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{}_{}", col, c)))
            .collect()
    }

    /// Write the indicator block for one row into `out`, which must be
    /// zeroed and `width()` long. Unseen labels leave their block zero.
    pub fn encode_into(&self, labels: &[String], out: &mut [f64]) {
        let mut offset = 0;
        for (label, cats) in labels.iter().zip(&self.categories) {
            if let Ok(pos) = cats.binary_search(label) {
                out[offset + pos] = 1.0;
            }
            offset += cats.len();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FittedLayout {
    numeric_columns: Vec<String>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    feature_names: Vec<String>,
}

/// Stateful frame → matrix transformer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureEngineer {
    config: FeatureEngineerConfig,
    fitted: Option<FittedLayout>,
}

impl FeatureEngineer {
    pub fn new(config: FeatureEngineerConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &FeatureEngineerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Output column names of the fitted layout.
    pub fn feature_names(&self) -> Result<&[String]> {
        self.fitted
            .as_ref()
            .map(|f| f.feature_names.as_slice())
            .ok_or(MansionError::NotFitted)
    }

    pub fn n_features(&self) -> Result<usize> {
        Ok(self.feature_names()?.len())
    }

    fn numeric_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        if self.config.include_derived {
            cols.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
        }
        cols
    }

    /// Fit the layout on `frame` and return `(matrix, target)`.
    ///
    /// Refitting replaces the previous layout. Nothing is modified when the
    /// target is unusable.
    pub fn fit_transform(&mut self, frame: &Frame, target_col: &str) -> Result<(Matrix, Vec<f64>)> {
        if frame.is_empty() {
            return Err(MansionError::Data("cannot fit on an empty frame".into()));
        }
        let target = frame.target(target_col)?;

        let numeric_columns = self.numeric_columns();
        let raw = raw_numeric(frame, &numeric_columns);
        let imputed: Vec<Vec<f64>> = raw
            .iter()
            .zip(&numeric_columns)
            .map(|(col, name)| {
                let fill = median(col).unwrap_or_else(|| {
                    debug!(column = %name, "Column has no values; imputing 0");
                    0.0
                });
                fill_missing(col, fill)
            })
            .collect();
        let scaler = StandardScaler::fit(&imputed);

        let labels = categorical_labels(frame);
        let encoder = OneHotEncoder::fit(&CATEGORICAL_COLUMNS, &labels);

        let mut feature_names = numeric_columns.clone();
        feature_names.extend(encoder.feature_names());

        let layout = FittedLayout {
            numeric_columns,
            scaler,
            encoder,
            feature_names,
        };
        let matrix = assemble(&layout, &imputed, &labels, frame.len())?;

        debug!(
            rows = matrix.n_rows(),
            features = matrix.n_cols(),
            "Fitted feature layout"
        );
        self.fitted = Some(layout);
        Ok((matrix, target))
    }

    /// Transform `frame` with the fitted layout.
    ///
    /// Missing numerics take the median of this frame, or the fitted mean
    /// when the frame has no value for the column at all.
    pub fn transform(&self, frame: &Frame) -> Result<Matrix> {
        let layout = self.fitted.as_ref().ok_or(MansionError::NotFitted)?;

        let raw = raw_numeric(frame, &layout.numeric_columns);
        let imputed: Vec<Vec<f64>> = raw
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let fill = median(col).unwrap_or(layout.scaler.mean[i]);
                fill_missing(col, fill)
            })
            .collect();
        let labels = categorical_labels(frame);

        assemble(layout, &imputed, &labels, frame.len())
    }
}

fn raw_numeric(frame: &Frame, columns: &[String]) -> Vec<Vec<Option<f64>>> {
    let derived: Vec<DerivedFeatures> = frame.rows().iter().map(DerivedFeatures::from_row).collect();
    columns
        .iter()
        .map(|name| {
            frame
                .rows()
                .iter()
                .zip(&derived)
                .map(|(row, d)| {
                    if DERIVED_COLUMNS.contains(&name.as_str()) {
                        d.get(name).filter(|v| v.is_finite())
                    } else {
                        row.numeric(name)
                    }
                })
                .collect()
        })
        .collect()
}

fn categorical_labels(frame: &Frame) -> Vec<Vec<String>> {
    CATEGORICAL_COLUMNS
        .iter()
        .map(|col| {
            frame
                .rows()
                .iter()
                .map(|r| r.category(col).unwrap_or_else(|| MISSING_CATEGORY.to_string()))
                .collect()
        })
        .collect()
}

fn fill_missing(col: &[Option<f64>], fill: f64) -> Vec<f64> {
    col.iter().map(|v| v.unwrap_or(fill)).collect()
}

/// Median of the present values; `None` when there are none.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    Some(if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    })
}

fn assemble(
    layout: &FittedLayout,
    numeric: &[Vec<f64>],
    labels: &[Vec<String>],
    n_rows: usize,
) -> Result<Matrix> {
    let n_numeric = layout.numeric_columns.len();
    let n_cols = n_numeric + layout.encoder.width();
    let mut data = vec![0.0; n_rows * n_cols];

    let mut row_labels = Vec::with_capacity(labels.len());
    for r in 0..n_rows {
        let out = &mut data[r * n_cols..(r + 1) * n_cols];
        for (c, col) in numeric.iter().enumerate() {
            out[c] = layout.scaler.apply(c, col[r]);
        }
        row_labels.clear();
        row_labels.extend(labels.iter().map(|col| col[r].clone()));
        layout.encoder.encode_into(&row_labels, &mut out[n_numeric..]);
    }

    let matrix = Matrix::new(data, n_rows, n_cols)?;
    if matrix.n_cols() != layout.feature_names.len() {
        return Err(MansionError::ShapeMismatch {
            expected: layout.feature_names.len(),
            actual: matrix.n_cols(),
        });
    }
    Ok(matrix)
}
