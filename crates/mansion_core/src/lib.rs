//! Kansai mansion price estimation: shared core
//!
//! Modules:
//! - `reference`: immutable lookup tables (stations, hazards, prices, prefectures)
//! - `resolvers`: derived-statistic lookups with fallback chains
//! - `frame`: transaction rows and the training-frame source
//! - `features`: the fit/transform feature pipeline
//! - `gbdt`: boosted tree representation and inference
//! - `canonical`: canonical JSON and BLAKE3 digests
//! - `settings`: process configuration

pub mod canonical;
pub mod errors;
pub mod features;
pub mod frame;
pub mod gbdt;
pub mod matrix;
pub mod reference;
pub mod resolvers;
pub mod settings;

pub use errors::{MansionError, Result};
pub use features::{FeatureEngineer, FeatureEngineerConfig, DERIVED_COLUMNS};
pub use frame::{
    CsvTrainingSource, Frame, TrainingFrameSource, TransactionRow, CATEGORICAL_COLUMNS,
    NUMERIC_COLUMNS, TARGET_COLUMN,
};
pub use gbdt::{GbdtModel, Node, Tree};
pub use matrix::Matrix;
pub use reference::ReferenceTables;
pub use resolvers::{
    parse_floor_plan, HazardProfile, LocationStats, RiskCategory, StationProfile, StationRank,
};
pub use settings::{Settings, TrainingSettings};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
