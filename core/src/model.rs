//! Immutable value records held by a loaded snapshot.
//!
//! RULE: Records are built once by the loader and never mutated.
//! Every query hands back borrowed views or freshly derived values.
//! Serialization produces the same camelCase shape the loader reads,
//! so `load(serialize(record))` reproduces the record.

use crate::types::{EntityId, MetricName, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Closed variant sets ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Status {
    Compliant,
    NonCompliant,
    Pending,
    UnderReview,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Compliant,
        Status::NonCompliant,
        Status::Pending,
        Status::UnderReview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Compliant    => "compliant",
            Status::NonCompliant => "non-compliant",
            Status::Pending      => "pending",
            Status::UnderReview  => "under-review",
        }
    }
}

/// Criteria priority. Declaration order is the fixed menu order:
/// critical < high < medium < low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High     => "high",
            Priority::Medium   => "medium",
            Priority::Low      => "low",
        }
    }
}

/// Risk level. `Ord` is severity (low < medium < high); listings and
/// sorts collate by wire name instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low    => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High   => "high",
        }
    }
}

/// Error for a string outside a closed variant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value:   String,
    pub allowed: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not one of [{}]", self.value, self.allowed.join(", "))
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! closed_variant_impls {
    ($ty:ident, [$($name:literal),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        value:   s.to_string(),
                        allowed: &[$($name),+],
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = UnknownVariant;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_variant_impls!(Status, ["compliant", "non-compliant", "pending", "under-review"]);
closed_variant_impls!(Priority, ["critical", "high", "medium", "low"]);
closed_variant_impls!(RiskLevel, ["low", "medium", "high"]);

// ── Regulation records ───────────────────────────────────────────────────────

/// One regulated meter category tracked for compliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationItem {
    pub id:              EntityId,
    pub name:            String,
    pub category:        String,
    pub status:          Status,
    pub compliance_rate: f64,
    #[serde(deserialize_with = "crate::loader::deserialize_timestamp")]
    pub last_updated:    Timestamp,
    pub risk_level:      RiskLevel,
    pub description:     String,
    pub criteria:        Vec<ComplianceCriteria>,
}

/// A checklist requirement attached to a regulation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCriteria {
    pub id:             EntityId,
    pub title:          String,
    pub description:    String,
    pub priority:       Priority,
    pub category:       String,
    pub requirements:   Vec<String>,
    #[serde(deserialize_with = "crate::loader::deserialize_timestamp")]
    pub last_reviewed:  Timestamp,
    pub document_links: Vec<String>,
}

// ── Metrics records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    pub overall_compliance_rate: f64,
    #[serde(deserialize_with = "crate::loader::deserialize_count")]
    pub total_regulation_items:  i64,
    #[serde(deserialize_with = "crate::loader::deserialize_count")]
    pub critical_issues:         i64,
    pub trends_data:             Vec<TrendPoint>,
    pub category_breakdown:      Vec<CategoryMetric>,
    #[serde(deserialize_with = "crate::loader::deserialize_timestamp")]
    pub last_updated:            Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(deserialize_with = "crate::loader::deserialize_date")]
    pub date:  NaiveDate,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetric {
    pub category:        String,
    pub compliance_rate: f64,
    #[serde(deserialize_with = "crate::loader::deserialize_count")]
    pub item_count:      i64,
    #[serde(deserialize_with = "crate::loader::deserialize_count")]
    pub critical_issues: i64,
}

// ── Analytics records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub historical_trends:    Vec<TimeSeriesData>,
    pub predictive_insights:  Vec<PredictionData>,
    pub comparative_analysis: Vec<ComparisonData>,
    pub risk_assessment:      Vec<RiskData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    #[serde(deserialize_with = "crate::loader::deserialize_date")]
    pub date:   NaiveDate,
    pub value:  f64,
    pub metric: MetricName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionData {
    pub metric:          MetricName,
    pub current_value:   f64,
    pub predicted_value: f64,
    pub confidence:      f64,
    pub timeframe:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub item_a:     String,
    pub item_b:     String,
    pub metric:     MetricName,
    pub value_a:    f64,
    pub value_b:    f64,
    pub difference: f64,
}

impl ComparisonData {
    /// Build a comparison with `difference = value_a - value_b`.
    pub fn new(
        item_a: impl Into<String>,
        item_b: impl Into<String>,
        metric: impl Into<MetricName>,
        value_a: f64,
        value_b: f64,
    ) -> Self {
        Self {
            item_a: item_a.into(),
            item_b: item_b.into(),
            metric: metric.into(),
            value_a,
            value_b,
            difference: value_a - value_b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskData {
    pub regulation_id:          EntityId,
    pub risk_level:             RiskLevel,
    pub risk_factors:           Vec<String>,
    pub mitigation_suggestions: Vec<String>,
}
