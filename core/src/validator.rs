//! Schema validator: per-record structural predicates.
//!
//! Variant sets and primitive types are already enforced by the loader,
//! so the checks here cover what a well-typed record can still get wrong:
//! empty identifiers, out-of-range rates, negative counts, confidence
//! outside 0–1, and non-finite numbers.
//!
//! Validation is pure: it reads a record and returns the names of the
//! violated fields. It never mutates input.

use crate::model::{
    CategoryMetric, ComplianceCriteria, MetricsData, PredictionData, RegulationItem, TrendPoint,
};
use std::fmt;

/// One violated field with a short reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field:  String,
    pub reason: &'static str,
}

impl Violation {
    fn new(field: impl Into<String>, reason: &'static str) -> Self {
        Self { field: field.into(), reason }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Record-level structural predicate.
pub trait Validate {
    fn violations(&self) -> Vec<Violation>;

    fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

/// Collected field checks for one record.
#[derive(Default)]
struct Checks(Vec<Violation>);

impl Checks {
    fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(Violation::new(field, "is required"));
        }
        self
    }

    fn rate(&mut self, field: &str, value: f64) -> &mut Self {
        self.range(field, value, 0.0, 100.0, "must be between 0 and 100")
    }

    fn unit(&mut self, field: &str, value: f64) -> &mut Self {
        self.range(field, value, 0.0, 1.0, "must be between 0 and 1")
    }

    fn range(&mut self, field: &str, value: f64, lo: f64, hi: f64, reason: &'static str) -> &mut Self {
        if !value.is_finite() || value < lo || value > hi {
            self.0.push(Violation::new(field, reason));
        }
        self
    }

    fn non_negative(&mut self, field: &str, value: i64) -> &mut Self {
        if value < 0 {
            self.0.push(Violation::new(field, "must be >= 0"));
        }
        self
    }

    fn finite(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.0.push(Violation::new(field, "must be a finite number"));
        }
        self
    }

    fn nested<T: Validate>(&mut self, field: &str, elements: &[T]) -> &mut Self {
        for (i, element) in elements.iter().enumerate() {
            for v in element.violations() {
                self.0.push(Violation::new(format!("{field}[{i}].{}", v.field), v.reason));
            }
        }
        self
    }

    fn done(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.0)
    }
}

impl Validate for RegulationItem {
    /// Nested criteria are not included; the integrity checker reports
    /// them individually so each criterion gets its own diagnostic.
    fn violations(&self) -> Vec<Violation> {
        Checks::default()
            .required("id", &self.id)
            .required("name", &self.name)
            .required("category", &self.category)
            .rate("complianceRate", self.compliance_rate)
            .done()
    }
}

impl Validate for ComplianceCriteria {
    fn violations(&self) -> Vec<Violation> {
        Checks::default()
            .required("id", &self.id)
            .required("title", &self.title)
            .required("category", &self.category)
            .done()
    }
}

impl Validate for MetricsData {
    fn violations(&self) -> Vec<Violation> {
        Checks::default()
            .rate("overallComplianceRate", self.overall_compliance_rate)
            .non_negative("totalRegulationItems", self.total_regulation_items)
            .non_negative("criticalIssues", self.critical_issues)
            .nested("trendsData", &self.trends_data)
            .done()
    }
}

impl Validate for TrendPoint {
    fn violations(&self) -> Vec<Violation> {
        Checks::default().finite("value", self.value).done()
    }
}

impl Validate for CategoryMetric {
    fn violations(&self) -> Vec<Violation> {
        Checks::default()
            .required("category", &self.category)
            .rate("complianceRate", self.compliance_rate)
            .non_negative("itemCount", self.item_count)
            .non_negative("criticalIssues", self.critical_issues)
            .done()
    }
}

impl Validate for PredictionData {
    fn violations(&self) -> Vec<Violation> {
        Checks::default()
            .required("metric", &self.metric)
            .finite("currentValue", self.current_value)
            .finite("predictedValue", self.predicted_value)
            .unit("confidence", self.confidence)
            .done()
    }
}

/// Field names only, for compact diagnostics.
pub fn violated_fields<T: Validate>(record: &T) -> Vec<String> {
    record.violations().into_iter().map(|v| v.field).collect()
}
