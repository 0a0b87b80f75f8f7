//! Mansion price predictor CLI
//!
//! Scores one apartment described by address, floor plan and size against
//! the latest trained artifact and prints the result as JSON. The `locate`
//! and `stations` subcommands inspect the reference tables without a model.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use mansion_core::{ReferenceTables, Settings};
use mansion_predictor::{locate, station_listing, PredictionRequest, PricePredictor};
use mansion_trainer::ModelArtifact;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mansion-predict")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Estimate a Kansai mansion price", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the price of one apartment
    Predict(PredictArgs),
    /// Show the location features derived from an address
    Locate {
        /// Address, e.g. "大阪府大阪市北区梅田"
        #[arg(long)]
        address: String,
    },
    /// List stations by daily passengers
    Stations {
        /// Show only the busiest N
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("age").required(true).args(["building_age", "building_year"])))]
struct PredictArgs {
    /// Address, e.g. "兵庫県神戸市中央区三宮町"
    #[arg(long)]
    address: String,

    /// Floor plan, e.g. "3LDK"
    #[arg(long)]
    floor_plan: String,

    /// Floor area in square metres
    #[arg(long)]
    area_sqm: f64,

    /// Year the price is estimated for
    #[arg(long)]
    prediction_year: i32,

    /// Building age in years at the prediction year
    #[arg(long)]
    building_age: Option<i32>,

    /// Construction year
    #[arg(long)]
    building_year: Option<i32>,

    /// Walking minutes to the nearest station
    #[arg(long)]
    time_to_station_min: Option<f64>,

    /// Model artifact (defaults to the configured model_path)
    #[arg(short, long)]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    let tables = match &settings.reference_tables {
        Some(path) => ReferenceTables::load_json(path)
            .with_context(|| format!("Failed to load reference tables {}", path.display()))?,
        None => ReferenceTables::shared().clone(),
    };

    match cli.command {
        Command::Predict(args) => predict(&settings, tables, args),
        Command::Locate { address } => print_json(&locate(&tables, &address)),
        Command::Stations { limit } => print_json(&station_listing(&tables, limit)),
    }
}

fn predict(settings: &Settings, tables: ReferenceTables, args: PredictArgs) -> Result<()> {
    let model_path = args.model.unwrap_or_else(|| settings.model_path.clone());
    info!(path = %model_path.display(), "Loading model");
    let artifact = ModelArtifact::load(&model_path)
        .with_context(|| format!("Failed to load model {}", model_path.display()))?;

    // production refuses a model trained against other reference tables
    let predictor = if settings.is_production() {
        PricePredictor::new_strict(artifact, tables).context("Reference tables mismatch")?
    } else {
        PricePredictor::new(artifact, tables)
    };

    let mut request = PredictionRequest::new(
        args.address,
        args.floor_plan,
        args.area_sqm,
        args.prediction_year,
    );
    request.building_age = args.building_age;
    request.building_year = args.building_year;
    request.time_to_station_min = args.time_to_station_min;

    let result = predictor.predict(&request).context("Prediction failed")?;
    print_json(&result)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize result")?
    );
    Ok(())
}
