//! Derived-statistic resolvers
//!
//! Pure lookups turning a raw key (station name, municipality, address) into
//! model features. Every resolver terminates with a value: a miss falls back
//! through the documented defaults rather than failing.

use crate::reference::hazard::{self, HazardScores};
use crate::reference::ReferenceTables;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Passenger count assumed when no station could be identified at all.
pub const DEFAULT_PASSENGER_COUNT: u64 = 30_000;

/// Stations with at least this many daily passengers rank as large.
pub const LARGE_STATION_THRESHOLD: u64 = 100_000;

/// Stations with at least this many daily passengers rank as medium.
pub const MEDIUM_STATION_THRESHOLD: u64 = 30_000;

/// Station area prices are approximated as a premium over the city average.
pub const STATION_PRICE_PREMIUM: f64 = 1.1;

const DEFAULT_ROOMS: u32 = 2;

static FLOOR_PLAN_ROOMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)[RLDKS]").expect("floor plan pattern is valid"));

/// Coarse station tier derived from passenger volume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StationRank {
    Large,
    Medium,
    Small,
    Unknown,
}

impl StationRank {
    pub fn from_passenger_count(count: Option<u64>) -> Self {
        match count {
            None => StationRank::Unknown,
            Some(c) if c >= LARGE_STATION_THRESHOLD => StationRank::Large,
            Some(c) if c >= MEDIUM_STATION_THRESHOLD => StationRank::Medium,
            Some(_) => StationRank::Small,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StationRank::Large => "large",
            StationRank::Medium => "medium",
            StationRank::Small => "small",
            StationRank::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StationRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier of the weighted hazard score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// `< 1.5` low, `< 2.5` medium, otherwise high.
    pub fn from_total(total: f64) -> Self {
        if total < 1.5 {
            RiskCategory::Low
        } else if total < 2.5 {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved hazard components plus the weighted total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HazardProfile {
    pub flood_risk: u8,
    pub tsunami_risk: u8,
    pub landslide_risk: u8,
    pub total_hazard_risk: f64,
    pub hazard_risk_category: RiskCategory,
}

impl HazardProfile {
    pub fn from_scores(scores: HazardScores) -> Self {
        let total = total_hazard_risk(scores);
        Self {
            flood_risk: scores.flood,
            tsunami_risk: scores.tsunami,
            landslide_risk: scores.landslide,
            total_hazard_risk: total,
            hazard_risk_category: RiskCategory::from_total(total),
        }
    }
}

/// Passenger-volume features of a station.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StationProfile {
    pub passenger_count: Option<u64>,
    pub log_passenger_count: f64,
    pub station_rank: StationRank,
    pub is_major_station: u8,
}

impl StationProfile {
    pub fn from_passenger_count(count: Option<u64>) -> Self {
        let rank = StationRank::from_passenger_count(count);
        let log_passenger_count = match count {
            Some(c) if c > 0 => (c as f64).log10(),
            _ => 0.0,
        };
        Self {
            passenger_count: count,
            log_passenger_count,
            station_rank: rank,
            is_major_station: u8::from(rank == StationRank::Large),
        }
    }

    /// Medium-rank profile substituted when no station is known.
    pub fn default_medium() -> Self {
        Self::from_passenger_count(Some(DEFAULT_PASSENGER_COUNT))
    }
}

/// Location features for one prediction row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationStats {
    pub city_avg_price_per_sqm: f64,
    pub station_avg_price_per_sqm: f64,
    pub station: StationProfile,
    pub hazard: HazardProfile,
}

/// Weighted hazard total: 0.40 flood + 0.35 tsunami + 0.25 landslide,
/// rounded to two decimals.
///
/// Computed in hundredths so the result is exact and category boundaries
/// never wobble on float error.
pub fn total_hazard_risk(scores: HazardScores) -> f64 {
    let hundredths = 40 * u32::from(scores.flood)
        + 35 * u32::from(scores.tsunami)
        + 25 * u32::from(scores.landslide);
    f64::from(hundredths) / 100.0
}

/// Price adjustment implied by hazard exposure: 1.05 at zero risk, 0.90 at
/// the maximum score of 5.
pub fn risk_discount_factor(total_risk: f64) -> f64 {
    1.05 - total_risk * 0.03
}

/// Extract `(num_rooms, has_ldk)` from a floor-plan string such as "3LDK".
///
/// Matching is case-insensitive and full-width forms ("３ＬＤＫ") read as
/// their ASCII equivalents. `num_rooms` is the first digit group directly
/// followed by R, L, D, K or S (2 when absent); `has_ldk` is 1 iff "LDK"
/// occurs.
pub fn parse_floor_plan(floor_plan: &str) -> (u32, u8) {
    let upper = fold_full_width(floor_plan).to_uppercase();

    let num_rooms = FLOOR_PLAN_ROOMS
        .captures(&upper)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_ROOMS);

    let has_ldk = u8::from(upper.contains("LDK"));

    (num_rooms, has_ldk)
}

/// Map the full-width ASCII block (U+FF01..=U+FF5E) onto ASCII.
fn fold_full_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            other => other,
        })
        .collect()
}

/// Pick the most specific key contained in `haystack`.
///
/// Longest key wins; `tie` orders equally long keys (smaller is preferred).
pub fn longest_match<'a, I, K>(haystack: &str, keys: I, tie: K) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
    K: Fn(&str, &str) -> std::cmp::Ordering,
{
    let mut best: Option<&'a str> = None;
    for key in keys {
        if key.is_empty() || !haystack.contains(key) {
            continue;
        }
        best = match best {
            None => Some(key),
            Some(current) => {
                let longer = key.chars().count() > current.chars().count();
                let same = key.chars().count() == current.chars().count();
                if longer || (same && tie(key, current) == std::cmp::Ordering::Less) {
                    Some(key)
                } else {
                    Some(current)
                }
            }
        };
    }
    best
}

impl ReferenceTables {
    /// Hazard profile: exact municipality → prefecture default → {2,1,1}.
    pub fn hazard_risk(&self, municipality: &str, prefecture: Option<&str>) -> HazardProfile {
        let scores = if let Some(s) = self.hazard_scores.get(municipality) {
            *s
        } else if let Some(s) = prefecture.and_then(|p| self.prefecture_hazard_defaults.get(p)) {
            debug!(municipality, ?prefecture, "Hazard fell back to prefecture default");
            *s
        } else {
            debug!(municipality, "Hazard fell back to global default");
            hazard::GLOBAL_DEFAULT
        };
        HazardProfile::from_scores(scores)
    }

    /// Local prefecture code (1-6) for an address; 1 when nothing matches.
    ///
    /// Full prefecture names are checked before city-name aliases, and longer
    /// names before shorter ones, so an alias can never shadow a full name.
    pub fn prefecture_code(&self, address: &str) -> u8 {
        let mut full: Vec<(&str, u8)> = self
            .prefectures
            .iter()
            .map(|p| (p.name.as_str(), p.code))
            .collect();
        let mut aliases: Vec<(&str, u8)> = self
            .prefectures
            .iter()
            .flat_map(|p| p.aliases.iter().map(move |a| (a.as_str(), p.code)))
            .collect();

        let by_specificity = |a: &(&str, u8), b: &(&str, u8)| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        };
        full.sort_by(by_specificity);
        aliases.sort_by(by_specificity);

        full.into_iter()
            .chain(aliases)
            .find(|(name, _)| !name.is_empty() && address.contains(name))
            .map(|(_, code)| code)
            .unwrap_or(1)
    }

    /// Strip the trailing "駅" and apply the alias table.
    pub fn normalize_station_name(&self, station_name: &str) -> String {
        let stripped = station_name.trim().trim_end_matches('駅');
        match self.station_aliases.get(stripped) {
            Some(canonical) => canonical.clone(),
            None => stripped.to_string(),
        }
    }

    /// Daily passengers for a station name: exact match after normalization,
    /// then substring match in either direction.
    pub fn passenger_count(&self, station_name: &str) -> Option<u64> {
        let normalized = self.normalize_station_name(station_name);
        if normalized.is_empty() {
            return None;
        }

        if let Some(count) = self.station_passengers.get(&normalized) {
            return Some(*count);
        }

        // Longest key first, then the busier station, then by name.
        self.station_passengers
            .iter()
            .filter(|(key, _)| key.contains(normalized.as_str()) || normalized.contains(key.as_str()))
            .max_by(|(ka, ca), (kb, cb)| {
                ka.chars()
                    .count()
                    .cmp(&kb.chars().count())
                    .then_with(|| ca.cmp(cb))
                    .then_with(|| kb.cmp(ka))
            })
            .map(|(_, count)| *count)
    }

    /// Station profile for a name; rank is `unknown` when unresolved.
    pub fn station_features(&self, station_name: &str) -> StationProfile {
        let count = self.passenger_count(station_name);
        if count.is_none() {
            debug!(station = station_name, "Station not found in passenger table");
        }
        StationProfile::from_passenger_count(count)
    }

    /// Average price per ㎡: exact municipality → prefecture default →
    /// global default.
    pub fn municipality_avg_price(&self, municipality: Option<&str>, prefecture: Option<&str>) -> u32 {
        municipality
            .and_then(|m| self.municipality_prices.get(m))
            .or_else(|| prefecture.and_then(|p| self.prefecture_price_defaults.get(p)))
            .copied()
            .unwrap_or(self.default_price_per_sqm)
    }

    /// Location features for a prefecture code and optional station and
    /// municipality.
    ///
    /// Without a station a medium-rank default profile is used instead of
    /// `unknown`.
    pub fn estimate_location_stats(
        &self,
        prefecture_code: u8,
        station_name: Option<&str>,
        municipality: Option<&str>,
    ) -> LocationStats {
        let prefecture = self.prefecture_name(prefecture_code);
        let city_avg = f64::from(self.municipality_avg_price(municipality, prefecture));
        let station_avg = (city_avg * STATION_PRICE_PREMIUM).round();

        let station = match station_name {
            Some(name) => self.station_features(name),
            None => StationProfile::default_medium(),
        };

        let hazard = self.hazard_risk(municipality.unwrap_or(""), prefecture);

        LocationStats {
            city_avg_price_per_sqm: city_avg,
            station_avg_price_per_sqm: station_avg,
            station,
            hazard,
        }
    }

    /// Hazard profile for a free-text address.
    pub fn estimate_hazard_from_address(&self, address: &str) -> HazardProfile {
        let prefecture = longest_match(
            address,
            self.prefecture_hazard_defaults.keys().map(String::as_str),
            |a, b| a.cmp(b),
        );
        let municipality = longest_match(
            address,
            self.hazard_scores.keys().map(String::as_str),
            |a, b| a.cmp(b),
        );
        self.hazard_risk(municipality.unwrap_or(""), prefecture)
    }

    /// All stations with their rank, busiest first.
    pub fn station_master(&self) -> Vec<(String, u64, StationRank)> {
        let mut stations: Vec<(String, u64, StationRank)> = self
            .station_passengers
            .iter()
            .map(|(name, count)| {
                (
                    name.clone(),
                    *count,
                    StationRank::from_passenger_count(Some(*count)),
                )
            })
            .collect();
        stations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::builtin()
    }

    #[test]
    fn floor_plan_examples() {
        assert_eq!(parse_floor_plan("3LDK"), (3, 1));
        assert_eq!(parse_floor_plan("2DK"), (2, 0));
        assert_eq!(parse_floor_plan("1r"), (1, 0));
        assert_eq!(parse_floor_plan("3ldk"), (3, 1));
        assert_eq!(parse_floor_plan("4SLDK"), (4, 1));
        assert_eq!(parse_floor_plan("ワンルーム"), (2, 0));
        assert_eq!(parse_floor_plan(""), (2, 0));
    }

    #[test]
    fn floor_plan_accepts_full_width() {
        assert_eq!(parse_floor_plan("３LDK"), (3, 1));
        assert_eq!(parse_floor_plan("３ＬＤＫ"), (3, 1));
        assert_eq!(parse_floor_plan("１０ｋ"), (10, 0));
        assert_eq!(parse_floor_plan("２ＤＫ"), (2, 0));
    }

    #[test]
    fn floor_plan_digit_must_precede_room_letter() {
        // "12" is followed by '+', so the first qualifying group is "1K"
        assert_eq!(parse_floor_plan("12+1K"), (1, 0));
    }

    #[test]
    fn prefecture_codes() {
        let t = tables();
        assert_eq!(t.prefecture_code("大阪府大阪市"), 1);
        assert_eq!(t.prefecture_code("京都府京都市"), 2);
        assert_eq!(t.prefecture_code("兵庫県神戸市"), 3);
        assert_eq!(t.prefecture_code("奈良県奈良市"), 4);
        assert_eq!(t.prefecture_code("滋賀県大津市"), 5);
        assert_eq!(t.prefecture_code("和歌山県和歌山市"), 6);
        assert_eq!(t.prefecture_code("和歌山市本町"), 6);
        assert_eq!(t.prefecture_code("unknown region"), 1);
    }

    #[test]
    fn tokyo_is_not_kyoto() {
        // "東京都" contains "京都" but not "京都府"
        assert_eq!(tables().prefecture_code("東京都渋谷区"), 1);
    }

    #[test]
    fn full_name_beats_alias_regardless_of_table_order() {
        let mut t = tables();
        // Put an alias-bearing prefecture first and give Hyogo an alias that
        // also occurs inside an Osaka address.
        t.prefectures.reverse();
        if let Some(hyogo) = t.prefectures.iter_mut().find(|p| p.code == 3) {
            hyogo.aliases.push("北区".into());
        }
        assert_eq!(t.prefecture_code("大阪府大阪市北区"), 1);
    }

    #[test]
    fn hazard_lookup_chain() {
        let t = tables();

        let exact = t.hazard_risk("大阪市此花区", Some("大阪府"));
        assert_eq!((exact.flood_risk, exact.tsunami_risk, exact.landslide_risk), (4, 4, 0));
        assert_eq!(exact.total_hazard_risk, 3.0);
        assert_eq!(exact.hazard_risk_category, RiskCategory::High);

        let pref = t.hazard_risk("架空町", Some("京都府"));
        assert_eq!((pref.flood_risk, pref.tsunami_risk, pref.landslide_risk), (2, 0, 2));
        assert_eq!(pref.total_hazard_risk, 1.3);
        assert_eq!(pref.hazard_risk_category, RiskCategory::Low);

        let global = t.hazard_risk("", None);
        assert_eq!((global.flood_risk, global.tsunami_risk, global.landslide_risk), (2, 1, 1));
        assert_eq!(global.total_hazard_risk, 1.4);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(RiskCategory::from_total(1.49), RiskCategory::Low);
        assert_eq!(RiskCategory::from_total(1.5), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_total(2.49), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_total(2.5), RiskCategory::High);
    }

    #[test]
    fn discount_factor_range() {
        assert!((risk_discount_factor(0.0) - 1.05).abs() < 1e-12);
        assert!((risk_discount_factor(5.0) - 0.90).abs() < 1e-12);
    }

    #[test]
    fn station_resolution_chain() {
        let t = tables();

        // exact after stripping the suffix
        assert_eq!(t.passenger_count("京都駅"), Some(350_000));
        // alias
        assert_eq!(t.passenger_count("阪急梅田駅"), Some(500_000));
        assert_eq!(t.passenger_count("天王寺駅前"), Some(140_000));
        // substring: key inside the name
        assert_eq!(t.passenger_count("JR姫路"), Some(65_000));
        // substring: name inside the key
        assert_eq!(t.passenger_count("西大寺"), Some(55_000));
        // miss
        assert_eq!(t.passenger_count("札幌"), None);
        assert_eq!(t.passenger_count("駅"), None);
    }

    #[test]
    fn substring_prefers_longest_key() {
        // Both "大阪" and "新大阪" are contained; the longer key wins.
        assert_eq!(tables().passenger_count("JR新大阪"), Some(95_000));
    }

    #[test]
    fn station_profiles() {
        let t = tables();

        let large = t.station_features("梅田");
        assert_eq!(large.station_rank, StationRank::Large);
        assert_eq!(large.is_major_station, 1);
        assert!((large.log_passenger_count - 500_000f64.log10()).abs() < 1e-12);

        let small = t.station_features("白浜");
        assert_eq!(small.station_rank, StationRank::Small);
        assert_eq!(small.is_major_station, 0);

        let unknown = t.station_features("札幌");
        assert_eq!(unknown.station_rank, StationRank::Unknown);
        assert_eq!(unknown.passenger_count, None);
        assert_eq!(unknown.log_passenger_count, 0.0);
    }

    #[test]
    fn location_stats_defaults() {
        let t = tables();

        let osaka = t.estimate_location_stats(1, None, None);
        assert_eq!(osaka.city_avg_price_per_sqm, 450_000.0);
        assert_eq!(osaka.station_avg_price_per_sqm, 495_000.0);
        assert_eq!(osaka.station.station_rank, StationRank::Medium);
        assert_eq!(osaka.station.passenger_count, Some(DEFAULT_PASSENGER_COUNT));

        let kyoto = t.estimate_location_stats(2, None, None);
        assert_eq!(kyoto.city_avg_price_per_sqm, 420_000.0);

        let unknown = t.estimate_location_stats(99, None, None);
        assert_eq!(unknown.city_avg_price_per_sqm, 350_000.0);
        assert_eq!(unknown.hazard.total_hazard_risk, 1.4);
    }

    #[test]
    fn location_stats_with_municipality_and_station() {
        let stats = tables().estimate_location_stats(1, Some("梅田"), Some("大阪市北区"));
        assert_eq!(stats.city_avg_price_per_sqm, 850_000.0);
        assert_eq!(stats.station_avg_price_per_sqm, 935_000.0);
        assert_eq!(stats.station.station_rank, StationRank::Large);
        assert_eq!(stats.hazard.total_hazard_risk, 0.8);
    }

    #[test]
    fn unresolved_station_name_stays_unknown() {
        let stats = tables().estimate_location_stats(3, Some("札幌"), None);
        assert_eq!(stats.station.station_rank, StationRank::Unknown);
        assert_eq!(stats.city_avg_price_per_sqm, 380_000.0);
    }

    #[test]
    fn hazard_from_address() {
        let t = tables();
        let h = t.estimate_hazard_from_address("和歌山県和歌山市本町");
        assert_eq!((h.flood_risk, h.tsunami_risk, h.landslide_risk), (3, 4, 2));

        let pref_only = t.estimate_hazard_from_address("兵庫県佐用郡");
        assert_eq!(pref_only.total_hazard_risk, 2.0);

        let none = t.estimate_hazard_from_address("北海道札幌市");
        assert_eq!(none.total_hazard_risk, 1.4);
    }

    #[test]
    fn station_master_is_sorted_by_volume() {
        let master = tables().station_master();
        assert_eq!(master[0].0, "梅田");
        assert!(master.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn longest_match_tie_break() {
        let keys = ["京都", "烏丸", "京都市"];
        let found = longest_match("京都府京都市烏丸", keys.iter().copied(), |a, b| a.cmp(b));
        assert_eq!(found, Some("京都市"));

        let found = longest_match("烏丸京都", ["京都", "烏丸"].iter().copied(), |a, b| b.cmp(a));
        assert_eq!(found, Some("烏丸"));
    }
}
