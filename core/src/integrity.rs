//! Integrity checker: cross-record consistency over a loaded snapshot.
//!
//! Every violation becomes one diagnostic string; the checker never stops
//! at the first failure and never returns an error. Callers decide whether
//! a known-imperfect snapshot is acceptable (`IntegrityReport::into_result`).
//!
//! Checks, in report order:
//!   1. Each regulation item, then each of its criteria
//!   2. Duplicate item ids
//!   3. Metrics record and each category breakdown entry
//!   4. Declared item total vs actual item count
//!   5. Analytics: prediction confidence, comparison differences,
//!      risk assessments referencing unknown items

use crate::{
    error::ValidationError,
    model::{AnalyticsData, MetricsData, RegulationItem},
    types::FLOAT_TOLERANCE,
    validator::{Validate, Violation},
};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub valid:  bool,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.valid {
            Ok(())
        } else {
            Err(ValidationError { errors: self.errors })
        }
    }
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_or_unknown(id: &str) -> &str {
    if id.trim().is_empty() { "unknown" } else { id }
}

pub fn check_integrity(
    items: &[RegulationItem],
    metrics: &MetricsData,
    analytics: &AnalyticsData,
) -> IntegrityReport {
    let mut errors = Vec::new();

    check_items(items, &mut errors);
    check_metrics(items, metrics, &mut errors);
    check_analytics(items, analytics, &mut errors);

    for e in &errors {
        log::warn!("integrity: {e}");
    }
    log::info!(
        "Integrity check over {} items: {} violation(s)",
        items.len(),
        errors.len()
    );

    IntegrityReport::from_errors(errors)
}

fn check_items(items: &[RegulationItem], errors: &mut Vec<String>) {
    let mut seen: HashSet<&str> = HashSet::new();

    for (i, item) in items.iter().enumerate() {
        let id = id_or_unknown(&item.id);

        let violations = item.violations();
        if !violations.is_empty() {
            errors.push(format!(
                "Invalid regulation item at index {i}: {id} ({})",
                describe(&violations)
            ));
        }

        for (j, criterion) in item.criteria.iter().enumerate() {
            let violations = criterion.violations();
            if !violations.is_empty() {
                errors.push(format!(
                    "Invalid criteria at index {j} for item {id} ({})",
                    describe(&violations)
                ));
            }
        }

        if !item.id.is_empty() && !seen.insert(item.id.as_str()) {
            errors.push(format!("Duplicate regulation item id at index {i}: {}", item.id));
        }
    }
}

fn check_metrics(items: &[RegulationItem], metrics: &MetricsData, errors: &mut Vec<String>) {
    let violations = metrics.violations();
    if !violations.is_empty() {
        errors.push(format!(
            "Invalid metrics data structure ({})",
            describe(&violations)
        ));
    }

    for (k, entry) in metrics.category_breakdown.iter().enumerate() {
        let violations = entry.violations();
        if !violations.is_empty() {
            errors.push(format!(
                "Invalid category breakdown at index {k}: {} ({})",
                id_or_unknown(&entry.category),
                describe(&violations)
            ));
        }
    }

    let actual = items.len() as i64;
    if metrics.total_regulation_items != actual {
        errors.push(format!(
            "Metrics total ({}) doesn't match actual items count ({actual})",
            metrics.total_regulation_items
        ));
    }
}

fn check_analytics(items: &[RegulationItem], analytics: &AnalyticsData, errors: &mut Vec<String>) {
    for (k, prediction) in analytics.predictive_insights.iter().enumerate() {
        let violations = prediction.violations();
        if !violations.is_empty() {
            errors.push(format!(
                "Invalid prediction at index {k}: {} ({})",
                id_or_unknown(&prediction.metric),
                describe(&violations)
            ));
        }
    }

    for (k, c) in analytics.comparative_analysis.iter().enumerate() {
        let expected = c.value_a - c.value_b;
        if !c.difference.is_finite() || (c.difference - expected).abs() > FLOAT_TOLERANCE {
            errors.push(format!(
                "Comparison at index {k} ({} vs {}, {}) declares difference {} but values differ by {expected}",
                c.item_a, c.item_b, c.metric, c.difference
            ));
        }
    }

    let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    for (k, risk) in analytics.risk_assessment.iter().enumerate() {
        if !known.contains(risk.regulation_id.as_str()) {
            errors.push(format!(
                "Risk assessment at index {k} references unknown regulation item {}",
                risk.regulation_id
            ));
        }
    }
}
