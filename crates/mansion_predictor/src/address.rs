//! Address resolution
//!
//! Turns a free-text Japanese address into the location keys the resolvers
//! understand. Every scan is longest-match-wins so that a short fragment
//! (e.g. "京都") never shadows a more specific one ("京都市下京区").

use mansion_core::resolvers::longest_match;
use mansion_core::ReferenceTables;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a nearest-station guess came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationSource {
    /// A station name appears verbatim in the address
    Address,
    /// Inferred from a district name via the area hint table
    AreaHint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationMatch {
    pub name: String,
    pub source: StationSource,
}

/// Location keys extracted from one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub prefecture_code: u8,
    pub prefecture: Option<String>,
    pub municipality: Option<String>,
    pub station: Option<StationMatch>,
}

impl ResolvedAddress {
    pub fn station_name(&self) -> Option<&str> {
        self.station.as_ref().map(|s| s.name.as_str())
    }
}

pub struct AddressResolver<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> AddressResolver<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn resolve(&self, address: &str) -> ResolvedAddress {
        let prefecture_code = self.tables.prefecture_code(address);
        let resolved = ResolvedAddress {
            prefecture_code,
            prefecture: self
                .tables
                .prefecture_name(prefecture_code)
                .map(str::to_string),
            municipality: self.municipality(address),
            station: self.nearest_station(address),
        };
        debug!(address, ?resolved, "Resolved address");
        resolved
    }

    /// Station named in the address, else the district hint, else none.
    ///
    /// Equally long station names prefer the busier station, then the
    /// lexicographically smaller name; equally long hints keep table order.
    pub fn nearest_station(&self, address: &str) -> Option<StationMatch> {
        let passengers = &self.tables.station_passengers;
        let named = longest_match(address, passengers.keys().map(String::as_str), |a, b| {
            let count = |k: &str| passengers.get(k).copied().unwrap_or(0);
            count(b).cmp(&count(a)).then_with(|| a.cmp(b))
        });
        if let Some(name) = named {
            return Some(StationMatch {
                name: name.to_string(),
                source: StationSource::Address,
            });
        }

        let hints = &self.tables.area_station_hints;
        let area = longest_match(address, hints.iter().map(|h| h.area.as_str()), |_, _| {
            std::cmp::Ordering::Equal
        })?;
        hints.iter().find(|h| h.area == area).map(|h| StationMatch {
            name: h.station.clone(),
            source: StationSource::AreaHint,
        })
    }

    /// Municipality from the price table, else from the hazard table.
    pub fn municipality(&self, address: &str) -> Option<String> {
        let by_name = |a: &str, b: &str| a.cmp(b);
        longest_match(
            address,
            self.tables.municipality_prices.keys().map(String::as_str),
            by_name,
        )
        .or_else(|| {
            longest_match(
                address,
                self.tables.hazard_scores.keys().map(String::as_str),
                by_name,
            )
        })
        .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mansion_core::reference::AreaHint;

    fn resolve(address: &str) -> ResolvedAddress {
        AddressResolver::new(ReferenceTables::shared()).resolve(address)
    }

    #[test]
    fn kobe_sannomiya() {
        let r = resolve("兵庫県神戸市中央区三宮町1丁目");
        assert_eq!(r.prefecture_code, 3);
        assert_eq!(r.prefecture.as_deref(), Some("兵庫県"));
        assert_eq!(r.municipality.as_deref(), Some("神戸市中央区"));
        // "神戸" is also present; the busier station wins the tie
        assert_eq!(r.station_name(), Some("三宮"));
    }

    #[test]
    fn kyoto_shimogyo() {
        let r = resolve("京都府京都市下京区東塩小路町");
        assert_eq!(r.prefecture_code, 2);
        assert_eq!(r.municipality.as_deref(), Some("京都市下京区"));
        assert_eq!(r.station_name(), Some("京都"));
    }

    #[test]
    fn nara_and_ashiya() {
        let nara = resolve("奈良県奈良市登大路町");
        assert_eq!(nara.prefecture_code, 4);
        assert_eq!(nara.municipality.as_deref(), Some("奈良市"));
        assert_eq!(nara.station_name(), Some("奈良"));

        let ashiya = resolve("兵庫県芦屋市船戸町");
        assert_eq!(ashiya.municipality.as_deref(), Some("芦屋市"));
        assert_eq!(ashiya.station_name(), Some("芦屋"));
    }

    #[test]
    fn osaka_chuo_prefers_ward_over_city() {
        let r = resolve("大阪府大阪市中央区");
        assert_eq!(r.prefecture_code, 1);
        assert_eq!(r.municipality.as_deref(), Some("大阪市中央区"));
        assert_eq!(
            r.station,
            Some(StationMatch {
                name: "大阪".into(),
                source: StationSource::Address
            })
        );
    }

    #[test]
    fn district_hint_when_no_station_named() {
        let r = resolve("東山区清水");
        assert_eq!(
            r.station,
            Some(StationMatch {
                name: "祇園四条".into(),
                source: StationSource::AreaHint
            })
        );
    }

    #[test]
    fn unknown_address() {
        let r = resolve("北海道札幌市");
        assert_eq!(r.prefecture_code, 1);
        assert_eq!(r.municipality, None);
        assert_eq!(r.station, None);
    }

    #[test]
    fn hazard_table_municipality_fallback() {
        // 此花区 has hazard scores but no price entry
        let r = resolve("大阪市此花区");
        assert_eq!(r.municipality.as_deref(), Some("大阪市此花区"));
    }

    #[test]
    fn hint_ties_keep_table_order() {
        let mut tables = ReferenceTables::builtin();
        tables.station_passengers.clear();
        tables.area_station_hints = vec![
            AreaHint {
                area: "西区".into(),
                station: "first".into(),
            },
            AreaHint {
                area: "北区".into(),
                station: "second".into(),
            },
        ];
        let resolver = AddressResolver::new(&tables);
        let hit = resolver.nearest_station("北区西区").map(|s| s.name);
        assert_eq!(hit.as_deref(), Some("first"));
    }
}
