//! Tabular training frame
//!
//! Rows mirror the `mart_training_dataset` view: eighteen columns, every one
//! of which may be missing. The frame also remembers which columns its source
//! actually carried so that an absent target column can be told apart from a
//! sparse one.

use crate::errors::{MansionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default regression target
pub const TARGET_COLUMN: &str = "trade_price";

/// Columns fed through the standardizer, in matrix order.
pub const NUMERIC_COLUMNS: [&str; 12] = [
    "area_sqm",
    "building_age",
    "num_rooms",
    "time_to_station_min",
    "coverage_ratio",
    "floor_area_ratio",
    "city_avg_price_per_sqm",
    "station_avg_price_per_sqm",
    "log_passenger_count",
    "total_hazard_risk",
    "trade_year",
    "quarter",
];

/// Columns fed through the one-hot encoder, in matrix order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "structure_type",
    "has_ldk",
    "prefecture_code",
    "station_rank",
    "hazard_risk_category",
];

/// Every column of a transaction row.
pub const TRANSACTION_COLUMNS: [&str; 18] = [
    "trade_price",
    "area_sqm",
    "building_age",
    "num_rooms",
    "has_ldk",
    "time_to_station_min",
    "coverage_ratio",
    "floor_area_ratio",
    "city_avg_price_per_sqm",
    "station_avg_price_per_sqm",
    "structure_type",
    "prefecture_code",
    "log_passenger_count",
    "station_rank",
    "total_hazard_risk",
    "hazard_risk_category",
    "trade_year",
    "quarter",
];

/// One transaction record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransactionRow {
    pub trade_price: Option<f64>,
    pub area_sqm: Option<f64>,
    pub building_age: Option<f64>,
    pub num_rooms: Option<f64>,
    pub has_ldk: Option<f64>,
    pub time_to_station_min: Option<f64>,
    pub coverage_ratio: Option<f64>,
    pub floor_area_ratio: Option<f64>,
    pub city_avg_price_per_sqm: Option<f64>,
    pub station_avg_price_per_sqm: Option<f64>,
    pub structure_type: Option<String>,
    pub prefecture_code: Option<f64>,
    pub log_passenger_count: Option<f64>,
    pub station_rank: Option<String>,
    pub total_hazard_risk: Option<f64>,
    pub hazard_risk_category: Option<String>,
    pub trade_year: Option<f64>,
    pub quarter: Option<f64>,
}

impl TransactionRow {
    fn raw_numeric(&self, column: &str) -> Option<Option<f64>> {
        let value = match column {
            "trade_price" => self.trade_price,
            "area_sqm" => self.area_sqm,
            "building_age" => self.building_age,
            "num_rooms" => self.num_rooms,
            "has_ldk" => self.has_ldk,
            "time_to_station_min" => self.time_to_station_min,
            "coverage_ratio" => self.coverage_ratio,
            "floor_area_ratio" => self.floor_area_ratio,
            "city_avg_price_per_sqm" => self.city_avg_price_per_sqm,
            "station_avg_price_per_sqm" => self.station_avg_price_per_sqm,
            "prefecture_code" => self.prefecture_code,
            "log_passenger_count" => self.log_passenger_count,
            "total_hazard_risk" => self.total_hazard_risk,
            "trade_year" => self.trade_year,
            "quarter" => self.quarter,
            _ => return None,
        };
        Some(value)
    }

    /// Finite numeric value of a column; `None` when missing, non-finite or
    /// not a numeric column.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.raw_numeric(column)
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Categorical label of a column. Numeric codes are rendered without a
    /// fractional part when integral, so `3.0` and `3` share a category.
    pub fn category(&self, column: &str) -> Option<String> {
        match column {
            "structure_type" => self.structure_type.clone(),
            "station_rank" => self.station_rank.clone(),
            "hazard_risk_category" => self.hazard_risk_category.clone(),
            other => self.numeric(other).map(category_label),
        }
        .filter(|s| !s.trim().is_empty())
    }

    fn has_value(&self, column: &str) -> bool {
        match column {
            "structure_type" => self.structure_type.is_some(),
            "station_rank" => self.station_rank.is_some(),
            "hazard_risk_category" => self.hazard_risk_category.is_some(),
            other => matches!(self.raw_numeric(other), Some(Some(_))),
        }
    }
}

/// Render a numeric code as a category label.
pub fn category_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Rows plus the set of columns the source provided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    rows: Vec<TransactionRow>,
    columns: BTreeSet<String>,
}

impl Frame {
    /// Build a frame from rows; a column counts as present when any row has
    /// a value for it.
    pub fn from_rows(rows: Vec<TransactionRow>) -> Self {
        let columns = TRANSACTION_COLUMNS
            .iter()
            .filter(|c| rows.iter().any(|r| r.has_value(c)))
            .map(|c| c.to_string())
            .collect();
        Self { rows, columns }
    }

    /// Build a frame with an explicit column set.
    pub fn with_columns<I, S>(rows: Vec<TransactionRow>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse CSV with a header row. Unknown columns are ignored, empty
    /// fields are missing values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let columns: BTreeSet<String> = rdr
            .headers()?
            .iter()
            .filter(|h| TRANSACTION_COLUMNS.contains(h))
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (line, record) in rdr.deserialize::<TransactionRow>().enumerate() {
            let row = record.map_err(|e| {
                MansionError::Data(format!("row {}: {}", line + 1, e))
            })?;
            rows.push(row);
        }

        Ok(Self { rows, columns })
    }

    /// Parse a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            MansionError::Data(format!(
                "failed to open training data {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Keep rows matching `keep`; the column set is unchanged.
    pub fn filter<F>(&self, keep: F) -> Frame
    where
        F: Fn(&TransactionRow) -> bool,
    {
        Frame {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }

    /// Target values for `column`.
    ///
    /// Fails when the column is absent, not numeric, or missing on any row.
    pub fn target(&self, column: &str) -> Result<Vec<f64>> {
        if !self.has_column(column) || !TRANSACTION_COLUMNS.contains(&column) {
            return Err(MansionError::Data(format!(
                "target column '{}' not found",
                column
            )));
        }

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.numeric(column).ok_or_else(|| {
                    MansionError::Data(format!(
                        "row {} has no numeric value for target '{}'",
                        i, column
                    ))
                })
            })
            .collect()
    }
}

/// Provider of the pre-aggregated training frame.
pub trait TrainingFrameSource {
    /// Rows with trade_price > 0 and area_sqm > 0.
    fn load_training_frame(&self) -> Result<Frame>;
}

/// Training frame exported from the mart as CSV.
#[derive(Debug, Clone)]
pub struct CsvTrainingSource {
    path: PathBuf,
}

impl CsvTrainingSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrainingFrameSource for CsvTrainingSource {
    fn load_training_frame(&self) -> Result<Frame> {
        let raw = Frame::from_csv(&self.path)?;
        let frame = raw.filter(|r| {
            r.numeric("trade_price").map_or(false, |p| p > 0.0)
                && r.numeric("area_sqm").map_or(false, |a| a > 0.0)
        });

        let dropped = raw.len() - frame.len();
        if dropped > 0 {
            warn!(dropped, "Dropped rows without positive trade_price and area_sqm");
        }
        info!(path = %self.path.display(), count = frame.len(), "Loaded training data");
        Ok(frame)
    }
}
