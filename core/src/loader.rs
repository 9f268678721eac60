//! Record loader: raw JSON documents to typed, immutable records.
//!
//! RULE: A single malformed record fails the whole load.
//! Nothing partially parsed ever escapes this module; callers either get
//! a complete collection or a `LoadError` naming the record and field.
//!
//! Records derive `Deserialize`; this module drives them one record at a
//! time through `serde_path_to_error` so a failure carries the field path
//! inside the record (`criteria[2].priority`).
//!
//! Date-like fields are normalised here:
//!   - timestamps accept RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` (UTC) or a
//!     plain `YYYY-MM-DD` (midnight UTC)
//!   - series dates accept a plain date or any of the timestamp shapes,
//!     keeping only the calendar date

use crate::{
    error::LoadError,
    model::{AnalyticsData, MetricsData, RegulationItem},
    types::Timestamp,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

// ── Timestamp normalisation ──────────────────────────────────────────────────

pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date_naive()))
}

// ── Field deserializers ──────────────────────────────────────────────────────

pub(crate) fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("'{raw}' is not an ISO-8601 timestamp")))
}

pub(crate) fn deserialize_date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("'{raw}' is not an ISO-8601 date")))
}

/// Whole-number count; `3.0` is accepted, `2.5` is not. Sign is left to
/// the validator.
pub(crate) fn deserialize_count<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let n = serde_json::Number::deserialize(d)?;
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(D::Error::custom(format!("{n} is not a whole number"))),
    }
}

// ── Record decoding ──────────────────────────────────────────────────────────

/// A top-level record type the loader can decode.
pub trait Record: DeserializeOwned {
    /// Human label used in diagnostics ("regulation item").
    const KIND: &'static str;
}

impl Record for RegulationItem {
    const KIND: &'static str = "regulation item";
}

impl Record for MetricsData {
    const KIND: &'static str = "metrics data";
}

impl Record for AnalyticsData {
    const KIND: &'static str = "analytics data";
}

/// Decode one record, mapping any serde failure to `Malformed` with the
/// path inside the record. Failures on the record itself use `<record>`.
pub fn decode<T: DeserializeOwned>(label: impl Into<String>, raw: &Value) -> Result<T, LoadError> {
    serde_path_to_error::deserialize(raw).map_err(|e| {
        let path = e.path().to_string();
        let field = if path == "." { "<record>".to_string() } else { path };
        LoadError::malformed(label, field, e.inner().to_string())
    })
}

fn record_label(kind: &str, index: usize, value: &Value) -> String {
    match value.get("id").and_then(Value::as_str) {
        Some(id) => format!("{kind} {index} ({id})"),
        None => format!("{kind} {index}"),
    }
}

/// Load a top-level JSON array into a collection of `T`.
pub fn load_collection<T: Record>(raw: &Value) -> Result<Vec<T>, LoadError> {
    let entries = raw
        .as_array()
        .ok_or_else(|| LoadError::malformed(format!("{} collection", T::KIND), "<root>", "must be an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, v)| decode(record_label(T::KIND, i, v), v))
        .collect()
}

/// Load a single top-level JSON object into `T`.
pub fn load_record<T: Record>(raw: &Value) -> Result<T, LoadError> {
    decode(T::KIND, raw)
}

// ── Document loaders ─────────────────────────────────────────────────────────

pub fn load_regulation_items(raw: &Value) -> Result<Vec<RegulationItem>, LoadError> {
    let items = load_collection::<RegulationItem>(raw)?;
    log::info!("Loaded {} regulation items", items.len());
    Ok(items)
}

pub fn load_metrics(raw: &Value) -> Result<MetricsData, LoadError> {
    let metrics = load_record::<MetricsData>(raw)?;
    log::info!(
        "Loaded metrics: {} trend points, {} categories",
        metrics.trends_data.len(),
        metrics.category_breakdown.len()
    );
    Ok(metrics)
}

pub fn load_analytics(raw: &Value) -> Result<AnalyticsData, LoadError> {
    let analytics = load_record::<AnalyticsData>(raw)?;
    log::info!(
        "Loaded analytics: {} trend points, {} predictions, {} comparisons, {} risk assessments",
        analytics.historical_trends.len(),
        analytics.predictive_insights.len(),
        analytics.comparative_analysis.len(),
        analytics.risk_assessment.len()
    );
    Ok(analytics)
}

/// Parse raw text as JSON, naming the source in the error.
pub fn parse_json(source_name: &str, text: &str) -> Result<Value, LoadError> {
    serde_json::from_str(text).map_err(|error| LoadError::Json {
        source_name: source_name.to_string(),
        error,
    })
}

pub fn load_regulation_items_from_str(text: &str) -> Result<Vec<RegulationItem>, LoadError> {
    load_regulation_items(&parse_json("regulation items", text)?)
}

pub fn load_metrics_from_str(text: &str) -> Result<MetricsData, LoadError> {
    load_metrics(&parse_json("metrics data", text)?)
}

pub fn load_analytics_from_str(text: &str) -> Result<AnalyticsData, LoadError> {
    load_analytics(&parse_json("analytics data", text)?)
}

/// Read and parse one JSON document from disk.
pub fn read_json_file(path: &std::path::Path) -> Result<Value, LoadError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
        path: display.clone(),
        error,
    })?;
    parse_json(&display, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Status, TrendPoint};
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn raw_item(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Smart Meter AMI",
            "category": "Smart Meters",
            "status": "compliant",
            "complianceRate": 95.5,
            "lastUpdated": "2024-01-15T10:30:00Z",
            "riskLevel": "low",
            "description": "Advanced metering infrastructure",
            "criteria": [{
                "id": "C-1",
                "title": "Accuracy class",
                "description": "Meets ANSI C12.20",
                "priority": "critical",
                "category": "Accuracy",
                "requirements": ["0.2 class", "annual test"],
                "lastReviewed": "2024-01-10",
                "documentLinks": []
            }]
        })
    }

    fn malformed(err: LoadError) -> (String, String, String) {
        match err {
            LoadError::Malformed { record, field, reason } => (record, field, reason),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn loads_item_and_normalises_dates() {
        let items = load_regulation_items(&json!([raw_item("REG-001")])).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.status, Status::Compliant);
        assert_eq!(item.last_updated.hour(), 10);
        assert_eq!(item.criteria[0].priority, Priority::Critical);
        assert_eq!(item.criteria[0].last_reviewed.day(), 10);
    }

    #[test]
    fn one_bad_record_fails_the_whole_load() {
        let mut bad = raw_item("REG-002");
        bad["complianceRate"] = json!("ninety");
        let (record, field, _) =
            malformed(load_regulation_items(&json!([raw_item("REG-001"), bad])).unwrap_err());
        assert_eq!(record, "regulation item 1 (REG-002)");
        assert_eq!(field, "complianceRate");
    }

    #[test]
    fn unknown_enum_value_is_rejected_at_load() {
        let mut bad = raw_item("REG-001");
        bad["status"] = json!("approved");
        let (_, field, reason) = malformed(load_regulation_items(&json!([bad])).unwrap_err());
        assert_eq!(field, "status");
        assert!(reason.contains("'approved' is not one of"), "{reason}");
    }

    #[test]
    fn nested_field_path_is_reported() {
        let mut bad = raw_item("REG-001");
        bad["criteria"][0]["requirements"] = json!(["ok", 7]);
        let (_, field, _) = malformed(load_regulation_items(&json!([bad])).unwrap_err());
        assert_eq!(field, "criteria[0].requirements[1]");
    }

    #[test]
    fn missing_field_is_malformed() {
        let mut bad = raw_item("REG-001");
        bad.as_object_mut().unwrap().remove("description");
        let (_, field, reason) = malformed(load_regulation_items(&json!([bad])).unwrap_err());
        assert_eq!(field, "<record>");
        assert!(reason.contains("missing field `description`"), "{reason}");
    }

    #[test]
    fn timestamp_shapes() {
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:00.123+02:00").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15").is_some());
        assert!(parse_timestamp("15/01/2024").is_none());
        assert_eq!(parse_date("2024-03-01T08:00:00Z").map(|d| d.month()), Some(3));
    }

    #[test]
    fn bad_series_date_names_the_field() {
        let err = decode::<TrendPoint>("trend point", &json!({ "date": "March", "value": 1.0 })).unwrap_err();
        let (_, field, reason) = malformed(err);
        assert_eq!(field, "date");
        assert!(reason.contains("'March' is not an ISO-8601 date"), "{reason}");
    }

    #[test]
    fn counts_accept_whole_floats_only() {
        let metrics = |n: Value| {
            json!({
                "overallComplianceRate": 90.0,
                "totalRegulationItems": n,
                "criticalIssues": 0,
                "trendsData": [],
                "categoryBreakdown": [],
                "lastUpdated": "2024-01-15"
            })
        };
        assert_eq!(load_metrics(&metrics(json!(5.0))).unwrap().total_regulation_items, 5);
        let (_, field, _) = malformed(load_metrics(&metrics(json!(2.5))).unwrap_err());
        assert_eq!(field, "totalRegulationItems");
    }

    #[test]
    fn analytics_requires_all_four_arrays() {
        let raw = json!({
            "historicalTrends": [],
            "predictiveInsights": [],
            "comparativeAnalysis": []
        });
        let err = load_analytics(&raw).unwrap_err();
        assert!(err.to_string().contains("riskAssessment"), "{err}");
    }

    #[test]
    fn invalid_json_text_names_its_source() {
        let err = load_metrics_from_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Json { ref source_name, .. } if source_name == "metrics data"));
    }
}
