//! Filter, search and sort over borrowed snapshot records.
//!
//! RULES:
//!   - Results are new vectors of references; the snapshot is never touched.
//!   - Filters compose with AND. An absent or empty filter is no constraint.
//!   - Sorting is stable: equal keys keep input order in both directions,
//!     so identical criteria over identical input give identical output.

use crate::model::{
    AnalyticsData, ComparisonData, ComplianceCriteria, Priority, RegulationItem, RiskLevel,
    Status, TimeSeriesData,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

// ── Collation ────────────────────────────────────────────────────────────────

/// Case-insensitive ordering with a lowercase-first tiebreak.
///
/// Mirrors what a default locale collator does for the Latin text used in
/// regulation names: "apple" < "Banana" < "banana2", and "a" < "A".
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

// ── Sort specification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Category,
    Status,
    ComplianceRate,
    LastUpdated,
    RiskLevel,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name"           => Ok(SortKey::Name),
            "category"       => Ok(SortKey::Category),
            "status"         => Ok(SortKey::Status),
            "complianceRate" => Ok(SortKey::ComplianceRate),
            "lastUpdated"    => Ok(SortKey::LastUpdated),
            "riskLevel"      => Ok(SortKey::RiskLevel),
            other            => Err(format!("unknown sort key '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending"   => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other                 => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub sort_by:    SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl SortSpec {
    pub fn new(sort_by: SortKey, sort_order: SortOrder) -> Self {
        Self { sort_by, sort_order }
    }

    pub fn compare(&self, a: &RegulationItem, b: &RegulationItem) -> Ordering {
        let ord = match self.sort_by {
            SortKey::Name           => collate(&a.name, &b.name),
            SortKey::Category       => collate(&a.category, &b.category),
            SortKey::Status         => collate(a.status.as_str(), b.status.as_str()),
            SortKey::ComplianceRate => a.compliance_rate.total_cmp(&b.compliance_rate),
            SortKey::LastUpdated    => a.last_updated.cmp(&b.last_updated),
            SortKey::RiskLevel      => collate(a.risk_level.as_str(), b.risk_level.as_str()),
        };
        match self.sort_order {
            SortOrder::Ascending  => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

// ── Regulation item query ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemQuery {
    pub search:     Option<String>,
    pub category:   Option<String>,
    pub status:     Option<Status>,
    pub risk_level: Option<RiskLevel>,
    pub sort:       Option<SortSpec>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    pub fn sort_by(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = Some(SortSpec::new(key, order));
        self
    }

    pub fn matches(&self, item: &RegulationItem) -> bool {
        if let Some(term) = non_empty(&self.search) {
            let term = term.to_lowercase();
            let hit = contains_ci(&item.name, &term)
                || contains_ci(&item.description, &term)
                || contains_ci(&item.id, &term);
            if !hit {
                return false;
            }
        }
        if let Some(category) = non_empty(&self.category) {
            if item.category != category {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.risk_level.is_some_and(|r| r != item.risk_level) {
            return false;
        }
        true
    }
}

/// Filter then stably sort. Without a sort spec, input order is kept.
pub fn query<'a>(items: &'a [RegulationItem], criteria: &ItemQuery) -> Vec<&'a RegulationItem> {
    let mut out: Vec<&RegulationItem> = items.iter().filter(|i| criteria.matches(i)).collect();
    if let Some(spec) = criteria.sort {
        out.sort_by(|a, b| spec.compare(a, b));
    }
    log::debug!("item query matched {}/{}", out.len(), items.len());
    out
}

pub fn find_by_id<'a>(items: &'a [RegulationItem], id: &str) -> Option<&'a RegulationItem> {
    items.iter().find(|i| i.id == id)
}

// ── Filter menus ─────────────────────────────────────────────────────────────

pub fn unique_categories(items: &[RegulationItem]) -> Vec<&str> {
    items
        .iter()
        .map(|i| i.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct statuses, ordered by wire name.
pub fn unique_statuses(items: &[RegulationItem]) -> Vec<Status> {
    let mut out: Vec<Status> = Status::ALL
        .into_iter()
        .filter(|s| items.iter().any(|i| i.status == *s))
        .collect();
    out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out
}

/// Distinct risk levels, ordered by wire name (high, low, medium).
pub fn unique_risk_levels(items: &[RegulationItem]) -> Vec<RiskLevel> {
    let mut out: Vec<RiskLevel> = RiskLevel::ALL
        .into_iter()
        .filter(|r| items.iter().any(|i| i.risk_level == *r))
        .collect();
    out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out
}

// ── Criteria query ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CriteriaQuery {
    pub search:   Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl CriteriaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches(&self, c: &ComplianceCriteria) -> bool {
        if let Some(term) = non_empty(&self.search) {
            let term = term.to_lowercase();
            let hit = contains_ci(&c.title, &term)
                || contains_ci(&c.description, &term)
                || c.requirements.iter().any(|r| contains_ci(r, &term));
            if !hit {
                return false;
            }
        }
        if let Some(category) = non_empty(&self.category) {
            if c.category != category {
                return false;
            }
        }
        !self.priority.is_some_and(|p| p != c.priority)
    }
}

pub fn filter_criteria<'a>(
    criteria: &'a [ComplianceCriteria],
    q: &CriteriaQuery,
) -> Vec<&'a ComplianceCriteria> {
    criteria.iter().filter(|c| q.matches(c)).collect()
}

/// Distinct priorities in the fixed order critical, high, medium, low.
pub fn unique_priorities(criteria: &[ComplianceCriteria]) -> Vec<Priority> {
    criteria
        .iter()
        .map(|c| c.priority)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn unique_criteria_categories(criteria: &[ComplianceCriteria]) -> Vec<&str> {
    criteria
        .iter()
        .map(|c| c.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ── Analytics series ─────────────────────────────────────────────────────────

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Historical points for one metric (or all), inside a range, by date.
pub fn historical_trends<'a>(
    series: &'a [TimeSeriesData],
    metric: Option<&str>,
    range: Option<DateRange>,
) -> Vec<&'a TimeSeriesData> {
    let mut out: Vec<&TimeSeriesData> = series
        .iter()
        .filter(|p| metric.map_or(true, |m| p.metric == m))
        .filter(|p| range.map_or(true, |r| r.contains(p.date)))
        .collect();
    out.sort_by_key(|p| p.date);
    out
}

fn push_unique<'a>(out: &mut Vec<&'a str>, value: &'a str) {
    if !out.contains(&value) {
        out.push(value);
    }
}

/// Distinct metric names: historical series first, then predictions.
pub fn available_metrics(analytics: &AnalyticsData) -> Vec<&str> {
    let mut out = Vec::new();
    for p in &analytics.historical_trends {
        push_unique(&mut out, &p.metric);
    }
    for p in &analytics.predictive_insights {
        push_unique(&mut out, &p.metric);
    }
    out
}

pub fn comparison_metrics(comparisons: &[ComparisonData]) -> Vec<&str> {
    let mut out = Vec::new();
    for c in comparisons {
        push_unique(&mut out, &c.metric);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, name: &str, category: &str, rate: f64, risk: RiskLevel) -> RegulationItem {
        RegulationItem {
            id:              id.into(),
            name:            name.into(),
            category:        category.into(),
            status:          Status::Pending,
            compliance_rate: rate,
            last_updated:    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            risk_level:      risk,
            description:     format!("{name} description"),
            criteria:        vec![],
        }
    }

    #[test]
    fn collation_ignores_case_then_prefers_lowercase() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Banana", "banana2"), Ordering::Less);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn search_matches_id_name_or_description() {
        let items = vec![
            item("SM-001", "Smart Meter", "Smart", 90.0, RiskLevel::Low),
            item("AN-002", "Analog Meter", "Analog", 70.0, RiskLevel::High),
        ];
        let by_id = query(&items, &ItemQuery::new().search("an-0"));
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].id, "AN-002");

        let by_desc = query(&items, &ItemQuery::new().search("METER DESC"));
        assert_eq!(by_desc.len(), 2);
    }

    #[test]
    fn empty_filters_are_no_constraint() {
        let items = vec![item("A", "a", "x", 1.0, RiskLevel::Low)];
        let q = ItemQuery::new().search("").category("");
        assert_eq!(query(&items, &q).len(), 1);
    }

    #[test]
    fn risk_sort_collates_wire_names_and_is_stable() {
        let items = vec![
            item("1", "a", "x", 1.0, RiskLevel::High),
            item("2", "b", "x", 1.0, RiskLevel::Low),
            item("3", "c", "x", 1.0, RiskLevel::High),
            item("4", "d", "x", 1.0, RiskLevel::Medium),
        ];
        let asc = query(&items, &ItemQuery::new().sort_by(SortKey::RiskLevel, SortOrder::Ascending));
        let ids: Vec<_> = asc.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "2", "4"]);

        let desc = query(&items, &ItemQuery::new().sort_by(SortKey::RiskLevel, SortOrder::Descending));
        let ids: Vec<_> = desc.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn sort_keys_parse_from_field_names() {
        assert_eq!("complianceRate".parse::<SortKey>(), Ok(SortKey::ComplianceRate));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert!("rating".parse::<SortKey>().is_err());
    }

    #[test]
    fn item_query_deserializes_from_camel_case() {
        let q: ItemQuery = serde_json::from_value(serde_json::json!({
            "search": "meter",
            "riskLevel": "high",
            "sort": { "sortBy": "lastUpdated", "sortOrder": "desc" }
        }))
        .unwrap();
        assert_eq!(q.risk_level, Some(RiskLevel::High));
        assert_eq!(q.sort, Some(SortSpec::new(SortKey::LastUpdated, SortOrder::Descending)));
    }

    #[test]
    fn menus_are_sorted() {
        let items = vec![
            item("1", "a", "Smart", 1.0, RiskLevel::High),
            item("2", "b", "Analog", 1.0, RiskLevel::Low),
            item("3", "c", "Smart", 1.0, RiskLevel::High),
        ];
        assert_eq!(unique_categories(&items), vec!["Analog", "Smart"]);
        assert_eq!(unique_risk_levels(&items), vec![RiskLevel::High, RiskLevel::Low]);
        assert_eq!(unique_statuses(&items), vec![Status::Pending]);
        assert_eq!(find_by_id(&items, "3").map(|i| i.name.as_str()), Some("c"));
        assert!(find_by_id(&items, "9").is_none());
    }

    fn point(metric: &str, y: i32, m: u32, d: u32) -> TimeSeriesData {
        TimeSeriesData {
            date:   NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value:  1.0,
            metric: metric.into(),
        }
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let series = vec![
            point("compliance_rate", 2024, 3, 1),
            point("compliance_rate", 2024, 1, 1),
            point("compliance_rate", 2023, 12, 31),
            point("compliance_rate", 2024, 2, 1),
            point("meter_error_rate", 2024, 2, 1),
            point("compliance_rate", 2024, 3, 2),
        ];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        let dates: Vec<String> = historical_trends(&series, Some("compliance_rate"), Some(range))
            .iter()
            .map(|p| p.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);

        assert_eq!(historical_trends(&series, None, Some(range)).len(), 4);
        assert_eq!(historical_trends(&series, None, None).len(), series.len());
    }

    #[test]
    fn available_metrics_keep_first_appearance_order() {
        let analytics = AnalyticsData {
            historical_trends:    vec![
                point("meter_error_rate", 2024, 1, 1),
                point("compliance_rate", 2024, 1, 1),
                point("meter_error_rate", 2024, 2, 1),
            ],
            predictive_insights:  vec![
                crate::model::PredictionData {
                    metric:          "compliance_rate".into(),
                    current_value:   90.0,
                    predicted_value: 92.0,
                    confidence:      0.8,
                    timeframe:       "Q3".into(),
                },
                crate::model::PredictionData {
                    metric:          "billing_disputes".into(),
                    current_value:   12.0,
                    predicted_value: 9.0,
                    confidence:      0.7,
                    timeframe:       "Q3".into(),
                },
            ],
            comparative_analysis: vec![],
            risk_assessment:      vec![],
        };
        assert_eq!(
            available_metrics(&analytics),
            vec!["meter_error_rate", "compliance_rate", "billing_disputes"]
        );
    }
}
