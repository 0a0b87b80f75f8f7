use mansion_core::features::FeatureEngineer;
use mansion_core::reference::HazardScores;
use mansion_core::resolvers::{total_hazard_risk, RiskCategory};
use mansion_core::{parse_floor_plan, Frame, ReferenceTables, StationRank, TransactionRow};
use proptest::prelude::*;

fn hazard_scores() -> impl Strategy<Value = HazardScores> {
    (0u8..=5, 0u8..=5, 0u8..=5).prop_map(|(f, t, l)| HazardScores::new(f, t, l))
}

fn transaction_row() -> impl Strategy<Value = TransactionRow> {
    (
        1_000_000.0f64..200_000_000.0,
        prop::option::of(15.0f64..200.0),
        prop::option::of(0.0f64..60.0),
        prop::option::of(1.0f64..6.0),
        prop::option::of(prop::sample::select(vec!["RC", "SRC", "S"])),
        prop::option::of(prop::sample::select(vec!["large", "medium", "small", "unknown"])),
        prop::option::of(1u8..=6),
        prop::option::of(1.0f64..30.0),
    )
        .prop_map(|(price, area, age, rooms, structure, rank, pref, minutes)| TransactionRow {
            trade_price: Some(price),
            area_sqm: area,
            building_age: age,
            num_rooms: rooms,
            structure_type: structure.map(str::to_string),
            station_rank: rank.map(str::to_string),
            prefecture_code: pref.map(f64::from),
            time_to_station_min: minutes,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn floor_plan_reads_leading_room_count(
        rooms in 1u32..100,
        suffix in prop::sample::select(vec!["R", "K", "DK", "LDK", "SLDK", "ldk", "k"]),
    ) {
        let (parsed, has_ldk) = parse_floor_plan(&format!("{}{}", rooms, suffix));
        prop_assert_eq!(parsed, rooms);
        prop_assert_eq!(has_ldk == 1, suffix.eq_ignore_ascii_case("LDK") || suffix == "SLDK");
    }

    #[test]
    fn floor_plan_reads_full_width_digits(
        rooms in 1u32..100,
        suffix in prop::sample::select(vec!["LDK", "ＬＤＫ", "K", "ｋ"]),
    ) {
        let wide: String = rooms
            .to_string()
            .chars()
            .map(|d| char::from_u32(d as u32 + 0xFEE0).unwrap())
            .collect();
        let (parsed, has_ldk) = parse_floor_plan(&format!("{}{}", wide, suffix));
        prop_assert_eq!(parsed, rooms);
        prop_assert_eq!(has_ldk == 1, suffix.chars().count() == 3);
    }

    #[test]
    fn floor_plan_without_room_letter_defaults(text in "[0-9 +]{0,8}") {
        prop_assert_eq!(parse_floor_plan(&text), (2, 0));
    }

    #[test]
    fn prefecture_code_is_always_in_range(address in "\\PC{0,24}") {
        let code = ReferenceTables::shared().prefecture_code(&address);
        prop_assert!((1..=6).contains(&code));
    }

    #[test]
    fn full_prefecture_name_wins(idx in 0usize..6, tail in "[a-z0-9]{0,12}") {
        let tables = ReferenceTables::shared();
        let pref = &tables.prefectures[idx];
        let address = format!("{}{}", pref.name, tail);
        prop_assert_eq!(tables.prefecture_code(&address), pref.code);
    }

    #[test]
    fn hazard_total_is_monotone(base in hazard_scores(), component in 0usize..3) {
        let mut raised = base;
        match component {
            0 => raised.flood = (raised.flood + 1).min(5),
            1 => raised.tsunami = (raised.tsunami + 1).min(5),
            _ => raised.landslide = (raised.landslide + 1).min(5),
        }
        prop_assert!(total_hazard_risk(raised) >= total_hazard_risk(base));
    }

    #[test]
    fn hazard_category_matches_thresholds(scores in hazard_scores()) {
        let total = total_hazard_risk(scores);
        let expected = if total < 1.5 {
            RiskCategory::Low
        } else if total < 2.5 {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        };
        prop_assert_eq!(RiskCategory::from_total(total), expected);
    }

    #[test]
    fn location_stats_without_station(code in 0u8..10) {
        let stats = ReferenceTables::shared().estimate_location_stats(code, None, None);
        prop_assert_eq!(
            stats.station_avg_price_per_sqm,
            (stats.city_avg_price_per_sqm * 1.1).round()
        );
        prop_assert_eq!(stats.station.station_rank, StationRank::Medium);
    }

    #[test]
    fn transform_reproduces_fit(rows in prop::collection::vec(transaction_row(), 1..30)) {
        let frame = Frame::from_rows(rows);
        let mut engineer = FeatureEngineer::default();
        let (fitted, target) = engineer.fit_transform(&frame, "trade_price").unwrap();

        prop_assert_eq!(target.len(), frame.len());
        prop_assert_eq!(engineer.transform(&frame).unwrap(), fitted);
    }
}
