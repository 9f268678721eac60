//! Trend and prediction analyzer.
//!
//! - `trend_direction`:     last-two-point movement with a fixed noise floor
//! - `metric_summary`:      first-vs-last movement of a historical series
//! - `prediction_trend`:    polarity-aware improvement classification
//! - `comparative_extremes`: highest, lowest and widest gap for one metric
//!
//! Polarity comes from an explicit per-metric table. The name heuristic
//! ("compliance"/"rate" up is good, "issues"/"time" down is good) is only
//! a fallback, and a metric neither source knows is reported unclassified
//! rather than silently treated as improving or declining.

use crate::{
    error::QueryError,
    model::{AnalyticsData, ComparisonData, PredictionData, TrendPoint},
    query::historical_trends,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Changes smaller than this percentage are noise.
pub const TREND_NOISE_FLOOR_PCT: f64 = 0.1;
/// First-vs-last summaries below this percentage are stable.
pub const SUMMARY_STABLE_THRESHOLD_PCT: f64 = 1.0;

// ── Direction ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl TrendDirection {
    fn of_sign(delta: f64) -> Self {
        if delta > 0.0 {
            TrendDirection::Up
        } else if delta < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub direction:  TrendDirection,
    /// Magnitude of the percentage change; 0 when neutral.
    pub percentage: f64,
}

impl TrendSummary {
    const NEUTRAL: TrendSummary = TrendSummary {
        direction:  TrendDirection::Neutral,
        percentage: 0.0,
    };
}

/// Movement between the last two points of a time-ordered series.
pub fn trend_direction(series: &[TrendPoint]) -> TrendSummary {
    trend_direction_with(series, TREND_NOISE_FLOOR_PCT)
}

pub fn trend_direction_with(series: &[TrendPoint], noise_floor_pct: f64) -> TrendSummary {
    match series {
        [.., previous, latest] => movement(previous.value, latest.value, noise_floor_pct),
        _ => TrendSummary::NEUTRAL,
    }
}

/// Percentage movement from `previous` to `latest`.
///
/// A zero baseline has no defined percentage: the direction follows the
/// sign of the delta and the percentage is reported as 0.
pub fn movement(previous: f64, latest: f64, noise_floor_pct: f64) -> TrendSummary {
    if previous == 0.0 {
        return TrendSummary {
            direction:  TrendDirection::of_sign(latest - previous),
            percentage: 0.0,
        };
    }
    let change = (latest - previous) / previous * 100.0;
    if !change.is_finite() || change.abs() < noise_floor_pct {
        return TrendSummary::NEUTRAL;
    }
    TrendSummary {
        direction:  TrendDirection::of_sign(change),
        percentage: change.abs(),
    }
}

// ── Polarity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Legacy name sniffing over snake_case metric names. Matching is
    /// case-sensitive. `None` when the name matches neither pattern.
    pub fn infer(metric: &str) -> Option<Self> {
        if metric.contains("compliance") || metric.contains("rate") {
            Some(Polarity::HigherIsBetter)
        } else if metric.contains("issues") || metric.contains("time") {
            Some(Polarity::LowerIsBetter)
        } else {
            None
        }
    }
}

/// Explicit metric → polarity table with an optional name-heuristic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolarityTable {
    entries:          HashMap<String, Polarity>,
    infer_from_names: bool,
}

impl PolarityTable {
    pub fn new(infer_from_names: bool) -> Self {
        Self { entries: HashMap::new(), infer_from_names }
    }

    /// The dashboard's known series.
    pub fn with_defaults() -> Self {
        let mut table = Self::new(true);
        for (metric, polarity) in default_polarities() {
            table.insert(metric, polarity);
        }
        table
    }

    pub fn insert(&mut self, metric: impl Into<String>, polarity: Polarity) {
        self.entries.insert(metric.into(), polarity);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, Polarity)>) {
        self.entries.extend(entries);
    }

    pub fn resolve(&self, metric: &str) -> Option<Polarity> {
        match self.entries.get(metric) {
            Some(p) => Some(*p),
            None if self.infer_from_names => Polarity::infer(metric),
            None => None,
        }
    }
}

impl Default for PolarityTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub fn default_polarities() -> Vec<(String, Polarity)> {
    vec![
        ("overall_compliance".into(), Polarity::HigherIsBetter),
        ("renewable_energy_compliance".into(), Polarity::HigherIsBetter),
        ("inspection_rate".into(), Polarity::HigherIsBetter),
        ("critical_issues".into(), Polarity::LowerIsBetter),
        ("response_time".into(), Polarity::LowerIsBetter),
    ]
}

// ── Prediction classification ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionTrend {
    pub polarity:          Option<Polarity>,
    /// `None` when the metric's polarity is unknown.
    pub is_improving:      Option<bool>,
    pub absolute_change:   f64,
    pub percentage_change: f64,
}

pub fn prediction_trend(
    current: f64,
    predicted: f64,
    metric: &str,
    polarities: &PolarityTable,
) -> PredictionTrend {
    classify_change(current, predicted, polarities.resolve(metric))
}

pub fn classify_change(current: f64, predicted: f64, polarity: Option<Polarity>) -> PredictionTrend {
    let change = predicted - current;
    let is_improving = polarity.map(|p| match p {
        Polarity::HigherIsBetter => change > 0.0,
        Polarity::LowerIsBetter  => change < 0.0,
    });
    let percentage_change = if current == 0.0 {
        0.0
    } else {
        (change / current * 100.0).abs()
    };
    PredictionTrend {
        polarity,
        is_improving,
        absolute_change: change.abs(),
        percentage_change,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOverview {
    pub improving:          usize,
    pub declining:          usize,
    pub unclassified:       usize,
    pub average_confidence: f64,
}

pub fn prediction_overview(predictions: &[PredictionData], polarities: &PolarityTable) -> PredictionOverview {
    let mut overview = PredictionOverview::default();
    for p in predictions {
        let trend = prediction_trend(p.current_value, p.predicted_value, &p.metric, polarities);
        match trend.is_improving {
            Some(true)  => overview.improving += 1,
            Some(false) => overview.declining += 1,
            None        => overview.unclassified += 1,
        }
    }
    if !predictions.is_empty() {
        overview.average_confidence =
            predictions.iter().map(|p| p.confidence).sum::<f64>() / predictions.len() as f64;
    }
    overview
}

// ── Historical summary ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary<'a> {
    pub metric:            &'a str,
    pub current_value:     f64,
    pub change:            f64,
    pub change_percentage: f64,
    pub direction:         TrendDirection,
    pub prediction:        Option<&'a PredictionData>,
}

pub fn metric_summary<'a>(analytics: &'a AnalyticsData, metric: &'a str) -> Option<MetricSummary<'a>> {
    metric_summary_with(analytics, metric, SUMMARY_STABLE_THRESHOLD_PCT)
}

pub fn metric_summary_with<'a>(
    analytics: &'a AnalyticsData,
    metric: &'a str,
    stable_threshold_pct: f64,
) -> Option<MetricSummary<'a>> {
    let series = historical_trends(&analytics.historical_trends, Some(metric), None);
    let (first, last) = (series.first()?, series.last()?);

    let change = last.value - first.value;
    let (change_percentage, direction) = if first.value == 0.0 {
        (0.0, TrendDirection::of_sign(change))
    } else {
        let pct = change / first.value * 100.0;
        let direction = if pct.abs() < stable_threshold_pct {
            TrendDirection::Neutral
        } else {
            TrendDirection::of_sign(pct)
        };
        (pct, direction)
    };

    Some(MetricSummary {
        metric,
        current_value: last.value,
        change,
        change_percentage,
        direction,
        prediction: analytics.predictive_insights.iter().find(|p| p.metric == metric),
    })
}

// ── Comparative extremes ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extreme<'a> {
    pub label: &'a str,
    pub side:  Side,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap<'a> {
    /// Label of the side ahead (B when the difference is not positive).
    pub label:      &'a str,
    pub side:       Side,
    pub difference: f64,
    pub comparison: &'a ComparisonData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeExtremes<'a> {
    pub highest:     Extreme<'a>,
    pub lowest:      Extreme<'a>,
    pub largest_gap: Gap<'a>,
}

fn sides(c: &ComparisonData) -> [Extreme<'_>; 2] {
    [
        Extreme { label: &c.item_a, side: Side::A, value: c.value_a },
        Extreme { label: &c.item_b, side: Side::B, value: c.value_b },
    ]
}

/// Scan the comparisons for `metric`. Ties keep the first candidate seen,
/// with side A scanned before side B.
pub fn comparative_extremes<'a>(
    comparisons: &'a [ComparisonData],
    metric: &str,
) -> Result<ComparativeExtremes<'a>, QueryError> {
    let mut filtered = comparisons.iter().filter(|c| c.metric == metric);
    let first = filtered.next().ok_or_else(|| QueryError::EmptyMetricSet {
        metric: metric.to_string(),
    })?;

    let [a, b] = sides(first);
    let mut highest = if b.value > a.value { b } else { a };
    let mut lowest = if b.value < a.value { b } else { a };
    let mut widest = first;

    for c in filtered {
        for side in sides(c) {
            if side.value > highest.value {
                highest = side;
            }
            if side.value < lowest.value {
                lowest = side;
            }
        }
        if c.difference.abs() > widest.difference.abs() {
            widest = c;
        }
    }

    let largest_gap = if widest.difference > 0.0 {
        Gap { label: &widest.item_a, side: Side::A, difference: widest.difference, comparison: widest }
    } else {
        Gap { label: &widest.item_b, side: Side::B, difference: widest.difference, comparison: widest }
    };

    Ok(ComparativeExtremes { highest, lowest, largest_gap })
}
