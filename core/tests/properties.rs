//! Property tests for the query, stats, trend and loader invariants.

use chrono::{NaiveDate, TimeZone, Utc};
use meter_compliance_core::{
    loader,
    model::{ComplianceCriteria, Priority, RegulationItem, RiskLevel, Status, TrendPoint},
    query::{self, ItemQuery, SortKey, SortOrder},
    stats,
    trend::{self, TrendDirection, TREND_NOISE_FLOOR_PCT},
    validator::Validate,
};
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────────────

const CATEGORIES: [&str; 3] = ["Smart Meter Standards", "Billing Accuracy", "Renewable Energy"];

prop_compose! {
    fn criterion()(
        n in 0u32..1000,
        priority in prop::sample::select(Priority::ALL.to_vec()),
        requirements in prop::collection::vec("[a-z ]{1,12}", 0..3),
    ) -> ComplianceCriteria {
        ComplianceCriteria {
            id:             format!("CRIT-{n:03}"),
            title:          format!("Criterion {n}"),
            description:    String::new(),
            priority,
            category:       "Measurement".to_string(),
            requirements,
            last_reviewed:  Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            document_links: vec![],
        }
    }
}

prop_compose! {
    fn item()(
        n in 0u32..1000,
        name in "[A-Za-z][A-Za-z ]{0,15}",
        category in prop::sample::select(CATEGORIES.to_vec()),
        status in prop::sample::select(Status::ALL.to_vec()),
        rate in (0u32..=100).prop_map(f64::from),
        secs in 1_600_000_000i64..1_750_000_000,
        risk_level in prop::sample::select(RiskLevel::ALL.to_vec()),
        criteria in prop::collection::vec(criterion(), 0..3),
    ) -> RegulationItem {
        RegulationItem {
            id:              format!("REG-{n:03}"),
            name,
            category:        category.to_string(),
            status,
            compliance_rate: rate,
            last_updated:    Utc.timestamp_opt(secs, 0).unwrap(),
            risk_level,
            description:     String::new(),
            criteria,
        }
    }
}

fn sort_key() -> impl Strategy<Value = SortKey> {
    prop::sample::select(vec![
        SortKey::Name,
        SortKey::Category,
        SortKey::Status,
        SortKey::ComplianceRate,
        SortKey::LastUpdated,
        SortKey::RiskLevel,
    ])
}

fn sort_order() -> impl Strategy<Value = SortOrder> {
    prop::sample::select(vec![SortOrder::Ascending, SortOrder::Descending])
}

fn ptrs(items: &[&RegulationItem]) -> Vec<*const RegulationItem> {
    items.iter().map(|i| *i as *const RegulationItem).collect()
}

proptest! {
    /// Combined filters select exactly the items every single filter selects.
    #[test]
    fn filters_are_intersective(
        items in prop::collection::vec(item(), 0..20),
        term in "[A-Za-z]{1,2}",
        category in prop::sample::select(CATEGORIES.to_vec()),
        status in prop::sample::select(Status::ALL.to_vec()),
    ) {
        let by_search = ItemQuery::new().search(term.clone());
        let by_category = ItemQuery::new().category(category);
        let by_status = ItemQuery::new().status(status);

        let search_and_category = ItemQuery::new().search(term.clone()).category(category);
        let combined = query::query(&items, &search_and_category);
        let expected: Vec<&RegulationItem> = items
            .iter()
            .filter(|i| by_search.matches(i) && by_category.matches(i))
            .collect();
        prop_assert_eq!(ptrs(&combined), ptrs(&expected));

        let searched = ptrs(&query::query(&items, &by_search));
        let categorised = ptrs(&query::query(&items, &by_category));
        prop_assert!(ptrs(&combined).iter().all(|p| searched.contains(p) && categorised.contains(p)));

        let all_three = ItemQuery::new().search(term).category(category).status(status);
        let combined = query::query(&items, &all_three);
        let expected: Vec<&RegulationItem> = items
            .iter()
            .filter(|i| by_search.matches(i) && by_category.matches(i) && by_status.matches(i))
            .collect();
        prop_assert_eq!(ptrs(&combined), ptrs(&expected));
    }

    /// Search is a case-insensitive substring test over id, name and description.
    #[test]
    fn search_matches_case_insensitive_substrings(
        items in prop::collection::vec(item(), 1..20),
        pick in any::<prop::sample::Index>(),
        upper in any::<bool>(),
    ) {
        let target = pick.get(&items);
        let mut term: String = target.name.chars().take(3).collect();
        if upper {
            term = term.to_uppercase();
        }
        let hits = query::query(&items, &ItemQuery::new().search(term.clone()));
        prop_assert!(hits.iter().any(|i| std::ptr::eq(*i, target)));

        let needle = term.to_lowercase();
        for i in &hits {
            prop_assert!(
                i.id.to_lowercase().contains(&needle)
                    || i.name.to_lowercase().contains(&needle)
                    || i.description.to_lowercase().contains(&needle)
            );
        }
    }

    /// Sorting is a stable, idempotent permutation of the filtered set.
    #[test]
    fn sort_is_stable_and_idempotent(
        items in prop::collection::vec(item(), 0..20),
        key in sort_key(),
        order in sort_order(),
    ) {
        let q = ItemQuery::new().sort_by(key, order);
        let first = query::query(&items, &q);
        let second = query::query(&items, &q);
        prop_assert_eq!(ptrs(&first), ptrs(&second));
        prop_assert_eq!(first.len(), items.len());

        let spec = q.sort.unwrap();
        for pair in first.windows(2) {
            let ord = spec.compare(pair[0], pair[1]);
            prop_assert!(ord.is_le());
            if ord.is_eq() {
                let pos = |x: &RegulationItem| items.iter().position(|i| std::ptr::eq(i, x));
                prop_assert!(pos(pair[0]) < pos(pair[1]));
            }
        }
    }

    /// The four status counts partition the collection.
    #[test]
    fn stats_partition_the_items(items in prop::collection::vec(item(), 0..30)) {
        let s = stats::compliance_stats(&items);
        prop_assert_eq!(s.compliant + s.non_compliant + s.pending + s.under_review, s.total);
        prop_assert!((0.0..=100.0).contains(&s.compliance_rate));

        let breakdown = stats::category_breakdown(&items);
        let counted: i64 = breakdown.iter().map(|m| m.item_count).sum();
        prop_assert_eq!(counted as usize, items.len());
    }

    /// Above the noise floor the direction follows the sign of the change.
    #[test]
    fn trend_direction_follows_sign(previous in 1.0f64..1000.0, latest in 0.0f64..2000.0) {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let series = vec![
            TrendPoint { date: day(1), value: previous, category: None },
            TrendPoint { date: day(2), value: latest, category: None },
        ];
        let t = trend::trend_direction(&series);
        let pct = (latest - previous) / previous * 100.0;

        if pct.abs() < TREND_NOISE_FLOOR_PCT {
            prop_assert_eq!(t.direction, TrendDirection::Neutral);
            prop_assert_eq!(t.percentage, 0.0);
        } else {
            let expected = if pct > 0.0 { TrendDirection::Up } else { TrendDirection::Down };
            prop_assert_eq!(t.direction, expected);
            prop_assert!((t.percentage - pct.abs()).abs() < 1e-9);
        }
    }

    /// A valid record survives serialize → load and stays valid.
    #[test]
    fn valid_items_round_trip_through_the_loader(items in prop::collection::vec(item(), 0..10)) {
        let raw = serde_json::to_value(&items).unwrap();
        let loaded = loader::load_regulation_items(&raw).unwrap();
        prop_assert_eq!(&loaded, &items);
        prop_assert!(loaded.iter().all(Validate::is_valid));
    }
}
