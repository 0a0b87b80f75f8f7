//! Mansion price trainer CLI
//!
//! Trains a price model from the mart training export and writes a versioned
//! artifact plus `latest.json` to the model directory.

use anyhow::{Context, Result};
use clap::Parser;
use mansion_core::{
    CsvTrainingSource, ReferenceTables, Settings, TrainingFrameSource, TARGET_COLUMN,
};
use mansion_trainer::{ModelTrainer, TrainOptions};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TOP_IMPORTANCES: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "mansion-train")]
#[command(about = "Train the Kansai mansion price model", long_about = None)]
struct Args {
    /// Training CSV (defaults to the configured mart export)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registered model name
    #[arg(short, long)]
    model: Option<String>,

    /// Output directory for artifacts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Artifact version label (defaults to a UTC timestamp)
    #[arg(long)]
    version: Option<String>,

    /// Target column
    #[arg(long, default_value = TARGET_COLUMN)]
    target: String,

    /// Skip the hyperparameter grid search
    #[arg(long)]
    no_tune: bool,

    /// Cross-validation folds
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Held-out fraction
    #[arg(long)]
    test_size: Option<f64>,

    /// Shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(n) = args.cv_folds {
        settings.training.cv_folds = n;
    }
    if let Some(t) = args.test_size {
        settings.training.test_size = t;
    }
    if let Some(s) = args.seed {
        settings.training.seed = s;
    }
    if args.no_tune {
        settings.training.tune_hyperparameters = false;
    }
    settings.validate().context("Invalid training options")?;

    // RUST_LOG wins over the configured level unless --verbose is set
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %settings.environment,
        "Mansion price trainer"
    );

    let reference_version = match &settings.reference_tables {
        Some(path) => {
            ReferenceTables::load_json(path)
                .with_context(|| format!("Failed to load reference tables {}", path.display()))?
                .version
        }
        None => ReferenceTables::shared().version.clone(),
    };

    let input = args.input.unwrap_or_else(|| settings.training_data.clone());
    let frame = CsvTrainingSource::new(&input)
        .load_training_frame()
        .with_context(|| format!("Failed to load training data {}", input.display()))?;

    let model_name = args
        .model
        .unwrap_or_else(|| settings.training.model_name.clone());
    let output = args.output.unwrap_or_else(|| settings.model_dir.clone());

    let mut trainer = ModelTrainer::new(&model_name, &output)
        .context("Failed to create trainer")?
        .with_reference_version(reference_version);

    let options = TrainOptions {
        target_col: args.target,
        ..TrainOptions::from(&settings.training)
    };
    let metrics = trainer.train(&frame, &options).context("Training failed")?;

    let path = trainer
        .save(args.version.as_deref())
        .context("Failed to save model")?;

    println!("Model: {} ({})", trainer.model_name(), path.display());
    println!("  RMSE: {:.0}", metrics.rmse);
    println!("  MAE:  {:.0}", metrics.mae);
    println!("  MAPE: {:.2}%", metrics.mape);
    println!("  R2:   {:.4}", metrics.r2);
    println!("Top features:");
    for (rank, f) in trainer
        .feature_importances()
        .iter()
        .take(TOP_IMPORTANCES)
        .enumerate()
    {
        println!("  {:>2}. {:<40} {:.4}", rank + 1, f.feature, f.importance);
    }

    Ok(())
}
