//! Price predictor
//!
//! Rebuilds a single transaction row from user input with the same columns
//! the training frame carries, pushes it through the artifact's fitted
//! feature engineer and model, and widens the point estimate by the model's
//! held-out MAPE.

use mansion_core::{parse_floor_plan, Frame, MansionError, ReferenceTables, Result, TransactionRow};
use mansion_trainer::{ModelArtifact, Regressor, RegressionMetrics};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::address::{AddressResolver, ResolvedAddress};
use crate::locate::{locate, LocationReport};

/// Interval half-width multiplier applied to MAPE.
pub const INTERVAL_MAPE_MULTIPLIER: f64 = 1.5;
/// MAPE assumed when the artifact carries no usable value.
pub const DEFAULT_MAPE: f64 = 10.0;
/// Walking time used when the caller does not give one.
pub const DEFAULT_STATION_MINUTES: f64 = 10.0;
pub const DEFAULT_COVERAGE_RATIO: f64 = 60.0;
pub const DEFAULT_FLOOR_AREA_RATIO: f64 = 200.0;
pub const DEFAULT_STRUCTURE: &str = "RC";
pub const DEFAULT_QUARTER: f64 = 2.0;

/// User input for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub address: String,
    pub floor_plan: String,
    pub area_sqm: f64,
    pub prediction_year: i32,
    /// Mutually exclusive with `building_year`
    pub building_age: Option<i32>,
    pub building_year: Option<i32>,
    pub time_to_station_min: Option<f64>,
}

impl PredictionRequest {
    pub fn new(
        address: impl Into<String>,
        floor_plan: impl Into<String>,
        area_sqm: f64,
        prediction_year: i32,
    ) -> Self {
        Self {
            address: address.into(),
            floor_plan: floor_plan.into(),
            area_sqm,
            prediction_year,
            building_age: None,
            building_year: None,
            time_to_station_min: None,
        }
    }

    pub fn with_building_age(mut self, age: i32) -> Self {
        self.building_age = Some(age);
        self
    }

    pub fn with_building_year(mut self, year: i32) -> Self {
        self.building_year = Some(year);
        self
    }

    pub fn with_time_to_station(mut self, minutes: f64) -> Self {
        self.time_to_station_min = Some(minutes);
        self
    }

    /// Age at the prediction year, clamped at zero.
    pub fn effective_age(&self) -> Result<i32> {
        let age = match (self.building_age, self.building_year) {
            (Some(age), None) => age,
            (None, Some(year)) => self.prediction_year - year,
            (Some(_), Some(_)) => {
                return Err(MansionError::Input(
                    "give either building_age or building_year, not both".into(),
                ))
            }
            (None, None) => {
                return Err(MansionError::Input(
                    "either building_age or building_year must be provided".into(),
                ))
            }
        };
        Ok(age.max(0))
    }

    fn validate(&self) -> Result<()> {
        if !(self.area_sqm.is_finite() && self.area_sqm > 0.0) {
            return Err(MansionError::Input(format!(
                "area_sqm must be positive, got {}",
                self.area_sqm
            )));
        }
        if let Some(minutes) = self.time_to_station_min {
            if !(minutes.is_finite() && minutes >= 0.0) {
                return Err(MansionError::Input(format!(
                    "time_to_station_min must be non-negative, got {}",
                    minutes
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: i64,
    pub upper: i64,
}

/// Inputs as the model saw them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSummary {
    pub address: String,
    pub floor_plan: String,
    pub area_sqm: f64,
    pub building_age: i32,
    pub prediction_year: i32,
    pub prefecture: Option<String>,
    pub municipality: Option<String>,
    pub nearest_station: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Yen
    pub predicted_price: i64,
    pub predicted_price_per_sqm: i64,
    pub confidence_interval: ConfidenceInterval,
    pub input_summary: InputSummary,
    pub model_metrics: RegressionMetrics,
}

/// `price ± price · (mape / 100) · 1.5`; a missing or non-finite MAPE
/// counts as 10%.
pub fn confidence_interval(price: f64, mape: Option<f64>) -> (f64, f64) {
    let mape = mape.filter(|m| m.is_finite()).unwrap_or(DEFAULT_MAPE);
    let margin = price * (mape / 100.0) * INTERVAL_MAPE_MULTIPLIER;
    (price - margin, price + margin)
}

/// A request turned into a model row, with what was derived on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInput {
    pub row: TransactionRow,
    pub address: ResolvedAddress,
    pub building_age: i32,
}

/// Read-only predictor over a loaded artifact; cheap to clone and safe to
/// share between threads.
#[derive(Debug, Clone)]
pub struct PricePredictor {
    artifact: Arc<ModelArtifact>,
    tables: Arc<ReferenceTables>,
}

impl PricePredictor {
    /// Load an artifact and pair it with the built-in reference tables.
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Ok(Self::new(artifact, ReferenceTables::shared().clone()))
    }

    pub fn new(artifact: ModelArtifact, tables: ReferenceTables) -> Self {
        if artifact.training.reference_version != tables.version {
            warn!(
                trained_with = %artifact.training.reference_version,
                current = %tables.version,
                "Reference tables differ from the ones used in training"
            );
        }
        Self {
            artifact: Arc::new(artifact),
            tables: Arc::new(tables),
        }
    }

    /// Like [`PricePredictor::new`], but tables that differ from the ones
    /// used in training are a configuration error.
    pub fn new_strict(artifact: ModelArtifact, tables: ReferenceTables) -> Result<Self> {
        if artifact.training.reference_version != tables.version {
            return Err(MansionError::Configuration(format!(
                "model trained with reference tables {}, loaded {}",
                artifact.training.reference_version, tables.version
            )));
        }
        Ok(Self::new(artifact, tables))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Location features for an address, without scoring it.
    pub fn locate(&self, address: &str) -> LocationReport {
        locate(&self.tables, address)
    }

    /// Transaction row equivalent to a training row for this request.
    pub fn build_row(&self, request: &PredictionRequest) -> Result<PreparedInput> {
        request.validate()?;
        let age = request.effective_age()?;

        let resolved = AddressResolver::new(&self.tables).resolve(&request.address);
        let stats = self.tables.estimate_location_stats(
            resolved.prefecture_code,
            resolved.station_name(),
            resolved.municipality.as_deref(),
        );
        let (num_rooms, has_ldk) = parse_floor_plan(&request.floor_plan);

        let row = TransactionRow {
            trade_price: None,
            area_sqm: Some(request.area_sqm),
            building_age: Some(f64::from(age)),
            num_rooms: Some(f64::from(num_rooms)),
            has_ldk: Some(f64::from(has_ldk)),
            time_to_station_min: Some(
                request
                    .time_to_station_min
                    .unwrap_or(DEFAULT_STATION_MINUTES),
            ),
            coverage_ratio: Some(DEFAULT_COVERAGE_RATIO),
            floor_area_ratio: Some(DEFAULT_FLOOR_AREA_RATIO),
            city_avg_price_per_sqm: Some(stats.city_avg_price_per_sqm),
            station_avg_price_per_sqm: Some(stats.station_avg_price_per_sqm),
            structure_type: Some(DEFAULT_STRUCTURE.to_string()),
            prefecture_code: Some(f64::from(resolved.prefecture_code)),
            log_passenger_count: Some(stats.station.log_passenger_count),
            station_rank: Some(stats.station.station_rank.as_str().to_string()),
            total_hazard_risk: Some(stats.hazard.total_hazard_risk),
            hazard_risk_category: Some(stats.hazard.hazard_risk_category.as_str().to_string()),
            trade_year: Some(f64::from(request.prediction_year)),
            quarter: Some(DEFAULT_QUARTER),
        };
        Ok(PreparedInput {
            row,
            address: resolved,
            building_age: age,
        })
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        info!(
            address = %request.address,
            floor_plan = %request.floor_plan,
            area_sqm = request.area_sqm,
            prediction_year = request.prediction_year,
            "Predicting mansion price"
        );

        let PreparedInput {
            row,
            address: resolved,
            building_age,
        } = self.build_row(request)?;

        let x = self
            .artifact
            .feature_engineer
            .transform(&Frame::from_rows(vec![row]))?;
        let price = self
            .artifact
            .model
            .predict(&x)?
            .first()
            .copied()
            .ok_or_else(|| MansionError::Data("model returned no prediction".into()))?;

        let metrics = self.artifact.metrics;
        let (lower, upper) = confidence_interval(price, Some(metrics.mape));

        let result = PredictionResult {
            predicted_price: price.round() as i64,
            predicted_price_per_sqm: (price / request.area_sqm).round() as i64,
            confidence_interval: ConfidenceInterval {
                lower: lower.round() as i64,
                upper: upper.round() as i64,
            },
            input_summary: InputSummary {
                address: request.address.clone(),
                floor_plan: request.floor_plan.clone(),
                area_sqm: request.area_sqm,
                building_age,
                prediction_year: request.prediction_year,
                nearest_station: resolved.station_name().map(str::to_string),
                prefecture: resolved.prefecture,
                municipality: resolved.municipality,
            },
            model_metrics: metrics,
        };

        info!(predicted_price = result.predicted_price, "Prediction completed");
        Ok(result)
    }
}
