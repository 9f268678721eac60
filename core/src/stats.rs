//! Statistics aggregator: compliance summaries and category rankings.
//!
//! Every rate over a collection is guarded: an empty input gives 0.0,
//! never NaN.

use crate::model::{
    AnalyticsData, CategoryMetric, Priority, RegulationItem, RiskData, RiskLevel, Status,
};
use serde::Serialize;

/// A category is critical below this rate even with no critical issues.
pub const CRITICAL_RATE_THRESHOLD: f64 = 80.0;
/// At or above this rate a category is in good standing.
pub const GOOD_RATE_THRESHOLD: f64 = 90.0;
pub const DEFAULT_TOP_PERFORMERS: usize = 5;

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

// ── Compliance stats ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStats {
    pub total:           usize,
    pub compliant:       usize,
    pub non_compliant:   usize,
    pub pending:         usize,
    pub under_review:    usize,
    pub compliance_rate: f64,
}

pub fn compliance_stats(items: &[RegulationItem]) -> ComplianceStats {
    let count = |status: Status| items.iter().filter(|i| i.status == status).count();
    let compliant = count(Status::Compliant);
    ComplianceStats {
        total: items.len(),
        compliant,
        non_compliant:   count(Status::NonCompliant),
        pending:         count(Status::Pending),
        under_review:    count(Status::UnderReview),
        compliance_rate: percentage(compliant, items.len()),
    }
}

// ── Category breakdown ───────────────────────────────────────────────────────

/// Critical issues an item contributes: its critical-priority criteria,
/// counted only while the item is not compliant.
pub fn item_critical_issues(item: &RegulationItem) -> i64 {
    if item.status == Status::Compliant {
        return 0;
    }
    item.criteria
        .iter()
        .filter(|c| c.priority == Priority::Critical)
        .count() as i64
}

/// Per-category item count, mean compliance rate and summed critical
/// issues, in order of each category's first appearance.
pub fn category_breakdown(items: &[RegulationItem]) -> Vec<CategoryMetric> {
    let mut acc: Vec<(&str, f64, i64, i64)> = Vec::new();

    for item in items {
        let issues = item_critical_issues(item);
        match acc.iter_mut().find(|(c, ..)| *c == item.category) {
            Some((_, rate_sum, count, critical)) => {
                *rate_sum += item.compliance_rate;
                *count += 1;
                *critical += issues;
            }
            None => acc.push((item.category.as_str(), item.compliance_rate, 1, issues)),
        }
    }

    acc.into_iter()
        .map(|(category, rate_sum, count, critical)| CategoryMetric {
            category:        category.to_string(),
            compliance_rate: rate_sum / count as f64,
            item_count:      count,
            critical_issues: critical,
        })
        .collect()
}

pub fn is_critical_category(metric: &CategoryMetric, rate_threshold: f64) -> bool {
    metric.critical_issues > 0 || metric.compliance_rate < rate_threshold
}

/// Categories with open critical issues or a rate below 80.
pub fn critical_categories(breakdown: &[CategoryMetric]) -> Vec<&CategoryMetric> {
    critical_categories_below(breakdown, CRITICAL_RATE_THRESHOLD)
}

pub fn critical_categories_below(breakdown: &[CategoryMetric], rate_threshold: f64) -> Vec<&CategoryMetric> {
    breakdown
        .iter()
        .filter(|m| is_critical_category(m, rate_threshold))
        .collect()
}

/// The `n` highest-rate categories; ties keep input order.
pub fn top_performers(breakdown: &[CategoryMetric], n: usize) -> Vec<&CategoryMetric> {
    let mut ranked: Vec<&CategoryMetric> = breakdown.iter().collect();
    ranked.sort_by(|a, b| b.compliance_rate.total_cmp(&a.compliance_rate));
    ranked.truncate(n);
    ranked
}

pub fn average_compliance_rate(categories: &[CategoryMetric]) -> f64 {
    if categories.is_empty() {
        return 0.0;
    }
    categories.iter().map(|c| c.compliance_rate).sum::<f64>() / categories.len() as f64
}

// ── Status banding ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Good,
    Warning,
    Critical,
}

pub fn compliance_status(rate: f64) -> ComplianceStatus {
    compliance_status_with(rate, GOOD_RATE_THRESHOLD, CRITICAL_RATE_THRESHOLD)
}

pub fn compliance_status_with(rate: f64, good: f64, warning: f64) -> ComplianceStatus {
    if rate >= good {
        ComplianceStatus::Good
    } else if rate >= warning {
        ComplianceStatus::Warning
    } else {
        ComplianceStatus::Critical
    }
}

// ── Risk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub low:    usize,
    pub medium: usize,
    pub high:   usize,
}

pub fn risk_distribution(items: &[RegulationItem]) -> RiskDistribution {
    items.iter().fold(RiskDistribution::default(), |mut d, item| {
        match item.risk_level {
            RiskLevel::Low    => d.low += 1,
            RiskLevel::Medium => d.medium += 1,
            RiskLevel::High   => d.high += 1,
        }
        d
    })
}

pub fn risk_for_item<'a>(analytics: &'a AnalyticsData, regulation_id: &str) -> Option<&'a RiskData> {
    analytics
        .risk_assessment
        .iter()
        .find(|r| r.regulation_id == regulation_id)
}
