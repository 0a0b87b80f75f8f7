//! End-to-end prediction tests
//!
//! Trains a small model on synthetic rows built from the reference tables,
//! saves it, and predicts from free-text input through the loaded artifact.

use anyhow::Result;
use mansion_core::{Frame, MansionError, ReferenceTables, TransactionRow};
use mansion_predictor::{PredictionRequest, PricePredictor};
use mansion_trainer::{ModelArtifact, ModelTrainer, TrainOptions, LATEST_FILE};
use std::path::Path;
use tempfile::tempdir;

const ADDRESSES: [&str; 6] = [
    "大阪府大阪市北区梅田",
    "京都府京都市中京区",
    "兵庫県神戸市中央区三宮町",
    "奈良県奈良市",
    "滋賀県草津市",
    "和歌山県和歌山市",
];

/// Rows shaped like the mart export, priced by area and location.
fn training_rows(n: usize) -> Vec<TransactionRow> {
    let tables = ReferenceTables::shared();
    (0..n)
        .map(|i| {
            let code = (i % 6) as u8 + 1;
            let stats = tables.estimate_location_stats(code, None, None);
            let area = 30.0 + (i % 60) as f64;
            let age = (i % 35) as f64;
            let price = area * stats.city_avg_price_per_sqm * (1.0 - age * 0.01);
            TransactionRow {
                trade_price: Some(price),
                area_sqm: Some(area),
                building_age: Some(age),
                num_rooms: Some(1.0 + (i % 4) as f64),
                has_ldk: Some((i % 2) as f64),
                time_to_station_min: Some((i % 20) as f64),
                coverage_ratio: Some(60.0),
                floor_area_ratio: Some(200.0),
                city_avg_price_per_sqm: Some(stats.city_avg_price_per_sqm),
                station_avg_price_per_sqm: Some(stats.station_avg_price_per_sqm),
                structure_type: Some("RC".into()),
                prefecture_code: Some(f64::from(code)),
                log_passenger_count: Some(stats.station.log_passenger_count),
                station_rank: Some(stats.station.station_rank.as_str().into()),
                total_hazard_risk: Some(stats.hazard.total_hazard_risk),
                hazard_risk_category: Some(stats.hazard.hazard_risk_category.as_str().into()),
                trade_year: Some(2019.0 + (i % 5) as f64),
                quarter: Some(1.0 + (i % 4) as f64),
            }
        })
        .collect()
}

fn train_into(dir: &Path) -> Result<()> {
    let mut trainer = ModelTrainer::new("gradient_boosting", dir)?;
    let options = TrainOptions {
        tune_hyperparameters: false,
        ..TrainOptions::default()
    };
    trainer.train(&Frame::from_rows(training_rows(180)), &options)?;
    trainer.save(Some("test"))?;
    Ok(())
}

#[test]
fn test_end_to_end_prediction() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let request = PredictionRequest::new("兵庫県神戸市中央区三宮町1丁目", "3LDK", 70.0, 2024)
        .with_building_year(2010);
    let result = predictor.predict(&request)?;

    assert!(result.predicted_price > 0);
    assert_eq!(
        result.predicted_price_per_sqm,
        (result.predicted_price as f64 / 70.0).round() as i64
    );
    assert!(result.confidence_interval.lower <= result.predicted_price);
    assert!(result.confidence_interval.upper >= result.predicted_price);
    assert_eq!(result.input_summary.building_age, 14);
    assert_eq!(result.input_summary.prefecture.as_deref(), Some("兵庫県"));
    assert_eq!(result.input_summary.municipality.as_deref(), Some("神戸市中央区"));
    assert_eq!(result.input_summary.nearest_station.as_deref(), Some("三宮"));
    assert_eq!(result.model_metrics, predictor.artifact().metrics);
    Ok(())
}

#[test]
fn test_interval_follows_stored_mape() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let result = predictor.predict(
        &PredictionRequest::new("大阪府大阪市中央区", "2LDK", 55.0, 2024).with_building_age(10),
    )?;
    let mape = predictor.artifact().metrics.mape;
    let half_width = result.predicted_price as f64 * mape / 100.0 * 1.5;
    let lower = result.confidence_interval.lower as f64;
    let upper = result.confidence_interval.upper as f64;
    assert!((result.predicted_price as f64 - half_width - lower).abs() <= 2.0);
    assert!((result.predicted_price as f64 + half_width - upper).abs() <= 2.0);
    Ok(())
}

#[test]
fn test_prepared_row_carries_age_once() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let request = PredictionRequest::new("京都府京都市中京区", "2LDK", 60.0, 2024)
        .with_building_year(2030)
        .with_time_to_station(4.0);
    let prepared = predictor.build_row(&request)?;
    // built after the prediction year clamps to zero
    assert_eq!(prepared.building_age, 0);
    assert_eq!(prepared.row.building_age, Some(0.0));
    assert_eq!(prepared.row.time_to_station_min, Some(4.0));
    assert_eq!(prepared.address.municipality.as_deref(), Some("京都市中京区"));

    let result = predictor.predict(&request)?;
    assert_eq!(result.input_summary.building_age, prepared.building_age);
    Ok(())
}

#[test]
fn test_strict_predictor_rejects_other_reference_tables() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let artifact = ModelArtifact::load(&dir.path().join(LATEST_FILE))?;

    let tables = ReferenceTables::shared().clone();
    assert!(PricePredictor::new_strict(artifact.clone(), tables.clone()).is_ok());

    let mut other = tables;
    other.version = format!("{}-edited", other.version);
    assert!(matches!(
        PricePredictor::new_strict(artifact.clone(), other.clone()),
        Err(MansionError::Configuration(_))
    ));
    // the lenient constructor only warns
    let predictor = PricePredictor::new(artifact, other);
    assert!(predictor
        .predict(&PredictionRequest::new(ADDRESSES[3], "1K", 25.0, 2024).with_building_age(20))
        .is_ok());
    Ok(())
}

#[test]
fn test_locate_matches_prediction_summary() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let address = "大阪府大阪市北区梅田3丁目";
    let report = predictor.locate(address);
    let result =
        predictor.predict(&PredictionRequest::new(address, "3LDK", 70.0, 2024).with_building_age(5))?;

    assert_eq!(report.prefecture, result.input_summary.prefecture);
    assert_eq!(report.municipality, result.input_summary.municipality);
    assert_eq!(
        report.station.map(|s| s.name),
        result.input_summary.nearest_station
    );
    assert_eq!(report.jis_code.as_deref(), Some("27"));
    Ok(())
}

#[test]
fn test_age_input_errors() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let neither = PredictionRequest::new(ADDRESSES[0], "3LDK", 70.0, 2024);
    assert!(matches!(
        predictor.predict(&neither),
        Err(MansionError::Input(_))
    ));

    let both = neither.clone().with_building_age(3).with_building_year(2020);
    assert!(matches!(predictor.predict(&both), Err(MansionError::Input(_))));
    Ok(())
}

#[test]
fn test_larger_flats_cost_more() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let small = predictor.predict(
        &PredictionRequest::new(ADDRESSES[0], "1K", 30.0, 2022).with_building_age(5),
    )?;
    let large = predictor.predict(
        &PredictionRequest::new(ADDRESSES[0], "4LDK", 85.0, 2022).with_building_age(5),
    )?;
    assert!(large.predicted_price > small.predicted_price);
    Ok(())
}

#[test]
fn test_shared_across_threads() -> Result<()> {
    let dir = tempdir()?;
    train_into(dir.path())?;
    let predictor = PricePredictor::load(&dir.path().join(LATEST_FILE))?;

    let expected: Vec<i64> = ADDRESSES
        .iter()
        .map(|a| {
            predictor
                .predict(&PredictionRequest::new(*a, "3LDK", 65.0, 2024).with_building_age(8))
                .map(|r| r.predicted_price)
        })
        .collect::<Result<_, _>>()?;

    std::thread::scope(|s| {
        for (address, want) in ADDRESSES.iter().zip(&expected) {
            let predictor = predictor.clone();
            s.spawn(move || {
                let got = predictor
                    .predict(&PredictionRequest::new(*address, "3LDK", 65.0, 2024).with_building_age(8))
                    .unwrap();
                assert_eq!(got.predicted_price, *want);
            });
        }
    });
    Ok(())
}

#[test]
fn test_missing_artifact_is_configuration_error() {
    let dir = tempdir().unwrap();
    let err = PricePredictor::load(&dir.path().join(LATEST_FILE)).unwrap_err();
    assert!(matches!(err, MansionError::Configuration(_)));
}
