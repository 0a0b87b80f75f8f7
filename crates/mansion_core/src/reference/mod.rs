//! Static reference tables
//!
//! Station volumes, hazard scores, average prices and the prefecture
//! registry. Tables are built once at process start (either the built-in
//! defaults or a versioned JSON document) and handed to resolvers by
//! reference; nothing mutates them afterwards.

pub mod hazard;
pub mod prefectures;
pub mod prices;
pub mod stations;

use crate::errors::{MansionError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

pub use hazard::HazardScores;
pub use prefectures::Prefecture;
pub use stations::AreaHint;

/// Version tag of the compiled-in tables
pub const BUILTIN_VERSION: &str = "kansai-2022";

static BUILTIN: Lazy<ReferenceTables> = Lazy::new(ReferenceTables::builtin);

/// All lookup data used by the resolvers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceTables {
    pub version: String,
    pub prefectures: Vec<Prefecture>,
    pub station_passengers: BTreeMap<String, u64>,
    pub station_aliases: BTreeMap<String, String>,
    pub area_station_hints: Vec<AreaHint>,
    pub hazard_scores: BTreeMap<String, HazardScores>,
    pub prefecture_hazard_defaults: BTreeMap<String, HazardScores>,
    pub municipality_prices: BTreeMap<String, u32>,
    pub prefecture_price_defaults: BTreeMap<String, u32>,
    pub default_price_per_sqm: u32,
}

impl ReferenceTables {
    /// Build the compiled-in Kansai tables.
    pub fn builtin() -> Self {
        fn owned<V: Copy>(pairs: &[(&str, V)]) -> BTreeMap<String, V> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }

        Self {
            version: BUILTIN_VERSION.to_string(),
            prefectures: prefectures::builtin(),
            station_passengers: owned(stations::PASSENGERS),
            station_aliases: stations::ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            area_station_hints: stations::AREA_HINTS
                .iter()
                .map(|(area, station)| AreaHint {
                    area: area.to_string(),
                    station: station.to_string(),
                })
                .collect(),
            hazard_scores: owned(hazard::MUNICIPALITIES),
            prefecture_hazard_defaults: owned(hazard::PREFECTURE_DEFAULTS),
            municipality_prices: owned(prices::MUNICIPALITIES),
            prefecture_price_defaults: owned(prices::PREFECTURE_DEFAULTS),
            default_price_per_sqm: prices::GLOBAL_DEFAULT_PRICE,
        }
    }

    /// Process-wide instance of the built-in tables.
    pub fn shared() -> &'static ReferenceTables {
        &BUILTIN
    }

    /// Load a versioned table document from JSON and validate it.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MansionError::Configuration(format!(
                "failed to read reference tables {}: {}",
                path.display(),
                e
            ))
        })?;
        let tables: ReferenceTables = serde_json::from_str(&json)?;
        tables.validate()?;
        info!(
            path = %path.display(),
            version = %tables.version,
            stations = tables.station_passengers.len(),
            "Loaded reference tables"
        );
        Ok(tables)
    }

    /// Check the structural invariants resolvers rely on.
    pub fn validate(&self) -> Result<()> {
        let mut codes = BTreeSet::new();
        for pref in &self.prefectures {
            if !(1..=6).contains(&pref.code) {
                return Err(MansionError::Configuration(format!(
                    "prefecture {} has code {} outside 1..=6",
                    pref.name, pref.code
                )));
            }
            if !codes.insert(pref.code) {
                return Err(MansionError::Configuration(format!(
                    "duplicate prefecture code {}",
                    pref.code
                )));
            }
        }
        if !codes.contains(&1) {
            return Err(MansionError::Configuration(
                "prefecture code 1 (the default) is not registered".into(),
            ));
        }

        let scores = self
            .hazard_scores
            .iter()
            .chain(self.prefecture_hazard_defaults.iter());
        for (area, s) in scores {
            if s.flood > hazard::MAX_SCORE
                || s.tsunami > hazard::MAX_SCORE
                || s.landslide > hazard::MAX_SCORE
            {
                return Err(MansionError::Configuration(format!(
                    "hazard scores for {} exceed {}",
                    area,
                    hazard::MAX_SCORE
                )));
            }
        }

        for (alias, target) in &self.station_aliases {
            if !self.station_passengers.contains_key(target) {
                return Err(MansionError::Configuration(format!(
                    "station alias {} points at unknown station {}",
                    alias, target
                )));
            }
        }

        Ok(())
    }

    /// Full prefecture name for a local code.
    pub fn prefecture_name(&self, code: u8) -> Option<&str> {
        self.prefectures
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.name.as_str())
    }

    /// JIS code for a local code, as used by the transactions API.
    pub fn prefecture_jis_code(&self, code: u8) -> Option<&str> {
        self.prefectures
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.jis_code.as_str())
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}
