//! Location diagnostics
//!
//! Shows what the predictor derives from an address without scoring it,
//! and lists the station master. Both back the `locate` and `stations`
//! subcommands of `mansion-predict`.

use mansion_core::resolvers::risk_discount_factor;
use mansion_core::{HazardProfile, LocationStats, ReferenceTables, StationRank};
use serde::{Deserialize, Serialize};

use crate::address::{AddressResolver, StationMatch};

/// Everything the reference tables say about one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub address: String,
    pub prefecture_code: u8,
    pub prefecture: Option<String>,
    /// JIS X 0401 code used by the transactions API
    pub jis_code: Option<String>,
    pub municipality: Option<String>,
    pub station: Option<StationMatch>,
    /// Features a prediction row would carry
    pub location: LocationStats,
    /// Hazard read straight from the address text
    pub address_hazard: HazardProfile,
    pub risk_discount_factor: f64,
}

/// Resolve `address` and collect its derived location features.
pub fn locate(tables: &ReferenceTables, address: &str) -> LocationReport {
    let resolved = AddressResolver::new(tables).resolve(address);
    let location = tables.estimate_location_stats(
        resolved.prefecture_code,
        resolved.station_name(),
        resolved.municipality.as_deref(),
    );
    let address_hazard = tables.estimate_hazard_from_address(address);

    LocationReport {
        address: address.to_string(),
        prefecture_code: resolved.prefecture_code,
        jis_code: tables
            .prefecture_jis_code(resolved.prefecture_code)
            .map(str::to_string),
        prefecture: resolved.prefecture,
        municipality: resolved.municipality,
        station: resolved.station,
        location,
        risk_discount_factor: risk_discount_factor(address_hazard.total_hazard_risk),
        address_hazard,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationEntry {
    pub name: String,
    pub passenger_count: u64,
    pub rank: StationRank,
}

/// Busiest stations first; `limit` caps the list.
pub fn station_listing(tables: &ReferenceTables, limit: Option<usize>) -> Vec<StationEntry> {
    tables
        .station_master()
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(name, passenger_count, rank)| StationEntry {
            name,
            passenger_count,
            rank,
        })
        .collect()
}
