//! Mansion price predictor
//!
//! Resolves free-text addresses against the reference tables and scores
//! them with a trained artifact.

pub mod address;
pub mod locate;
pub mod predictor;

pub use address::{AddressResolver, ResolvedAddress, StationMatch, StationSource};
pub use locate::{locate, station_listing, LocationReport, StationEntry};
pub use predictor::{
    confidence_interval, ConfidenceInterval, InputSummary, PredictionRequest, PredictionResult,
    PreparedInput, PricePredictor,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
