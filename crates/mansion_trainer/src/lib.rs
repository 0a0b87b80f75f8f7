//! Mansion price trainer
//!
//! Deterministic gradient-boosted regression over the shared feature
//! pipeline, with k-fold grid search and a hashed artifact store.

pub mod artifact;
pub mod cart;
pub mod deterministic;
pub mod gbdt;
pub mod metrics;
pub mod models;
pub mod search;
pub mod split;
pub mod trainer;

use mansion_core::{CsvTrainingSource, Result, TrainingFrameSource};
use std::path::Path;

pub use artifact::{FeatureImportance, ModelArtifact, TrainingSummary, LATEST_FILE};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use gbdt::{GbdtParams, GbdtTrainer};
pub use metrics::RegressionMetrics;
pub use models::{FittedModel, ModelKind, ModelParams, ParamGrid, Regressor};
pub use search::{grid_search, CandidateScore, SearchOutcome};
pub use split::{train_test_split, KFold, TrainTestSplit};
pub use trainer::{ModelTrainer, TrainOptions};

/// Load a training CSV, train `model_name` and return the trainer ready to save.
pub fn train_from_csv(
    path: &Path,
    model_name: &str,
    model_dir: &Path,
    options: &TrainOptions,
) -> Result<ModelTrainer> {
    let frame = CsvTrainingSource::new(path).load_training_frame()?;
    let mut trainer = ModelTrainer::new(model_name, model_dir)?;
    trainer.train(&frame, options)?;
    Ok(trainer)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
