//! Model trainer
//!
//! Owns the feature engineer for the duration of training: fits it once,
//! splits the matrix, optionally grid-searches hyperparameters, evaluates on
//! the held-out rows and packages the result as a [`ModelArtifact`].

use mansion_core::{
    FeatureEngineer, FeatureEngineerConfig, Frame, MansionError, ReferenceTables, Result,
    TrainingSettings, TARGET_COLUMN,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::artifact::{FeatureImportance, ModelArtifact, TrainingSummary, ARTIFACT_FORMAT_VERSION};
use crate::metrics::RegressionMetrics;
use crate::models::{FittedModel, ModelKind, ParamGrid, Regressor};
use crate::search::grid_search;
use crate::split::{train_test_split, KFold};

/// Frames smaller than this train, with a warning.
pub const MIN_RECOMMENDED_ROWS: usize = 100;

/// Per-run training options
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub target_col: String,
    pub test_size: f64,
    pub tune_hyperparameters: bool,
    pub cv_folds: usize,
    pub seed: u64,
    /// Replaces the model's built-in search grid
    pub param_grid: Option<ParamGrid>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            target_col: TARGET_COLUMN.to_string(),
            test_size: 0.2,
            tune_hyperparameters: true,
            cv_folds: 5,
            seed: 42,
            param_grid: None,
        }
    }
}

impl From<&TrainingSettings> for TrainOptions {
    fn from(settings: &TrainingSettings) -> Self {
        Self {
            test_size: settings.test_size,
            tune_hyperparameters: settings.tune_hyperparameters,
            cv_folds: settings.cv_folds,
            seed: settings.seed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Trained {
    model: FittedModel,
    metrics: RegressionMetrics,
    importances: Vec<FeatureImportance>,
    summary: TrainingSummary,
}

/// Trains, saves and reloads one named model.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    kind: ModelKind,
    model_dir: PathBuf,
    feature_config: FeatureEngineerConfig,
    feature_engineer: FeatureEngineer,
    reference_version: String,
    trained: Option<Trained>,
    version: Option<String>,
}

impl ModelTrainer {
    /// Fails with a configuration error for an unregistered model name.
    pub fn new(model_name: &str, model_dir: impl Into<PathBuf>) -> Result<Self> {
        let kind = ModelKind::from_name(model_name)?;
        Ok(Self {
            kind,
            model_dir: model_dir.into(),
            feature_config: FeatureEngineerConfig::default(),
            feature_engineer: FeatureEngineer::default(),
            reference_version: ReferenceTables::shared().version.clone(),
            trained: None,
            version: None,
        })
    }

    pub fn with_feature_config(mut self, config: FeatureEngineerConfig) -> Self {
        self.feature_engineer = FeatureEngineer::new(config.clone());
        self.feature_config = config;
        self
    }

    /// Record which reference tables produced the training frame.
    pub fn with_reference_version(mut self, version: impl Into<String>) -> Self {
        self.reference_version = version.into();
        self
    }

    pub fn model_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn feature_engineer(&self) -> &FeatureEngineer {
        &self.feature_engineer
    }

    pub fn model(&self) -> Option<&FittedModel> {
        self.trained.as_ref().map(|t| &t.model)
    }

    pub fn metrics(&self) -> Option<&RegressionMetrics> {
        self.trained.as_ref().map(|t| &t.metrics)
    }

    pub fn feature_importances(&self) -> &[FeatureImportance] {
        self.trained
            .as_ref()
            .map(|t| t.importances.as_slice())
            .unwrap_or(&[])
    }

    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.trained.as_ref().map(|t| &t.summary)
    }

    /// Version of the last save or load.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Fit the engineer and model on `frame` and return held-out metrics.
    pub fn train(&mut self, frame: &Frame, options: &TrainOptions) -> Result<RegressionMetrics> {
        info!(
            model = self.model_name(),
            rows = frame.len(),
            tune = options.tune_hyperparameters,
            "Starting model training"
        );

        if frame.is_empty() {
            return Err(MansionError::Data("training frame is empty".into()));
        }
        let kfold = if options.tune_hyperparameters {
            Some(KFold::new(options.cv_folds)?)
        } else {
            None
        };
        if frame.len() < MIN_RECOMMENDED_ROWS {
            warn!(
                rows = frame.len(),
                recommended = MIN_RECOMMENDED_ROWS,
                "Training frame is small; metrics will be noisy"
            );
        }

        let mut engineer = FeatureEngineer::new(self.feature_config.clone());
        let (x, y) = engineer.fit_transform(frame, &options.target_col)?;
        let split = train_test_split(x.n_rows(), options.test_size, options.seed)?;

        let (params, cv_score) = match kfold {
            Some(kfold) => {
                let grid = options
                    .param_grid
                    .clone()
                    .unwrap_or_else(|| self.kind.param_grid());
                let outcome = grid_search(&grid.candidates(), &x, &y, &split.train, kfold)?;
                info!(params = ?outcome.best.params, score = outcome.best.mean_score, "Best parameters");
                (outcome.best.params, Some(outcome.best.mean_score))
            }
            None => (self.kind.default_params(), None),
        };

        let model = params.fit(&x, &y, Some(&split.train))?;

        let test_x = x.select_rows(&split.test);
        let test_y: Vec<f64> = split.test.iter().map(|&r| y[r]).collect();
        let predicted = model.predict(&test_x)?;
        let metrics = RegressionMetrics::compute(&test_y, &predicted);

        let importances = rank_importances(engineer.feature_names()?, &model.feature_importances());

        info!(
            rmse = metrics.rmse,
            mae = metrics.mae,
            mape = metrics.mape,
            r2 = metrics.r2,
            "Training completed"
        );

        let summary = TrainingSummary {
            target_col: options.target_col.clone(),
            n_train: split.train.len(),
            n_test: split.test.len(),
            seed: options.seed,
            tuned: options.tune_hyperparameters,
            params,
            cv_score,
            trained_at: chrono::Utc::now().to_rfc3339(),
            reference_version: self.reference_version.clone(),
        };

        self.feature_engineer = engineer;
        self.trained = Some(Trained {
            model,
            metrics,
            importances,
            summary,
        });
        self.version = None;
        Ok(metrics)
    }

    /// Package the trained state under `version`.
    pub fn artifact(&self, version: &str) -> Result<ModelArtifact> {
        let trained = self.trained.as_ref().ok_or(MansionError::NotFitted)?;
        Ok(ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_name: self.model_name().to_string(),
            version: version.to_string(),
            model: trained.model.clone(),
            feature_engineer: self.feature_engineer.clone(),
            metrics: trained.metrics,
            feature_importances: trained.importances.clone(),
            training: trained.summary.clone(),
        })
    }

    /// Save to the model directory; the version defaults to a UTC
    /// timestamp. Returns the versioned path.
    pub fn save(&mut self, version: Option<&str>) -> Result<PathBuf> {
        let version = version
            .map(str::to_string)
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string());
        let path = self.artifact(&version)?.save(&self.model_dir)?;
        self.version = Some(version);
        Ok(path)
    }

    /// Restore a trainer from a saved artifact without retraining.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_artifact(
            ModelArtifact::load(path)?,
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ))
    }

    pub fn from_artifact(artifact: ModelArtifact, model_dir: PathBuf) -> Self {
        let kind = artifact.model.kind();
        Self {
            kind,
            model_dir,
            feature_config: artifact.feature_engineer.config().clone(),
            feature_engineer: artifact.feature_engineer,
            reference_version: artifact.training.reference_version.clone(),
            trained: Some(Trained {
                model: artifact.model,
                metrics: artifact.metrics,
                importances: artifact.feature_importances,
                summary: artifact.training,
            }),
            version: Some(artifact.version),
        }
    }
}

/// Pair importances with column names, most important first; equal scores
/// keep column order.
pub fn rank_importances(names: &[String], scores: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(scores)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}
