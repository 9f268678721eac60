//! compliance-report: headless compliance summary over a data directory.
//!
//! Usage:
//!   compliance-report --data-dir ./data
//!   compliance-report --data-dir ./data --search meter --sort-by complianceRate --desc
//!   compliance-report --data-dir ./data --json --strict

use anyhow::{bail, Result};
use meter_compliance_core::{
    engine::ComplianceEngine,
    integrity::IntegrityReport,
    model::{CategoryMetric, RegulationItem},
    query::{self, ItemQuery, SortKey, SortOrder},
    stats::{self, ComplianceStats},
    trend::{self, ComparativeExtremes, PredictionOverview, TrendSummary},
};
use serde::Serialize;
use std::env;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    data_dir:            String,
    integrity:           IntegrityReport,
    stats:               ComplianceStats,
    category_breakdown:  Vec<CategoryMetric>,
    critical_categories: Vec<String>,
    top_performers:      Vec<String>,
    trend:               TrendSummary,
    predictions:         PredictionOverview,
    extremes:            Vec<ComparativeExtremes<'a>>,
    items:               Vec<&'a RegulationItem>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = parse_str(&args, "--data-dir").unwrap_or("./data");
    let json = args.iter().any(|a| a == "--json");
    let strict = args.iter().any(|a| a == "--strict");
    let descending = args.iter().any(|a| a == "--desc");

    let mut item_query = ItemQuery::new();
    if let Some(term) = parse_str(&args, "--search") {
        item_query = item_query.search(term);
    }
    if let Some(category) = parse_str(&args, "--category") {
        item_query = item_query.category(category);
    }
    if let Some(key) = parse_str(&args, "--sort-by") {
        let key: SortKey = key.parse().map_err(anyhow::Error::msg)?;
        let order = if descending { SortOrder::Descending } else { SortOrder::Ascending };
        item_query = item_query.sort_by(key, order);
    }

    let engine = ComplianceEngine::open(Path::new(data_dir))?;
    let snapshot = engine.snapshot();

    let integrity = engine.integrity();
    if strict && !integrity.valid {
        for e in &integrity.errors {
            log::error!("{e}");
        }
        bail!("{} integrity violation(s) in {data_dir}", integrity.errors.len());
    }

    let breakdown = stats::category_breakdown(&snapshot.items);
    let critical = engine
        .critical_categories(&breakdown)
        .iter()
        .map(|m| m.category.clone())
        .collect();
    let top = engine
        .top_performers(&breakdown)
        .iter()
        .map(|m| m.category.clone())
        .collect();

    let analytics = &snapshot.analytics;
    let extremes = query::comparison_metrics(&analytics.comparative_analysis)
        .into_iter()
        .filter_map(|metric| trend::comparative_extremes(&analytics.comparative_analysis, metric).ok())
        .collect();

    let report = Report {
        data_dir:            data_dir.to_string(),
        integrity,
        stats:               stats::compliance_stats(&snapshot.items),
        category_breakdown:  breakdown,
        critical_categories: critical,
        top_performers:      top,
        trend:               engine.trend_direction(&snapshot.metrics.trends_data),
        predictions:         engine.prediction_overview(&analytics.predictive_insights),
        extremes,
        items:               query::query(&snapshot.items, &item_query),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&engine, &report);
    }
    Ok(())
}

fn print_summary(engine: &ComplianceEngine, report: &Report<'_>) {
    let s = &report.stats;
    println!("Meter Compliance: compliance-report");
    println!("  data_dir:  {}", report.data_dir);
    println!();

    println!("=== INTEGRITY ===");
    if report.integrity.valid {
        println!("  ok");
    } else {
        for e in &report.integrity.errors {
            println!("  ! {e}");
        }
    }

    println!();
    println!("=== COMPLIANCE ===");
    println!("  items:          {}", s.total);
    println!("  compliant:      {}", s.compliant);
    println!("  non-compliant:  {}", s.non_compliant);
    println!("  pending:        {}", s.pending);
    println!("  under review:   {}", s.under_review);
    println!("  rate:           {:.1}% ({:?})", s.compliance_rate, engine.compliance_status(s.compliance_rate));
    println!(
        "  trend:          {:?} {:.2}%",
        report.trend.direction, report.trend.percentage
    );

    println!();
    println!("=== CATEGORIES ===");
    for m in &report.category_breakdown {
        println!(
            "  {:<28} {:>6.1}% | items: {:>3} | critical: {}",
            m.category, m.compliance_rate, m.item_count, m.critical_issues
        );
    }
    println!("  critical:       {}", join_or_none(&report.critical_categories));
    println!("  top performers: {}", join_or_none(&report.top_performers));

    println!();
    println!("=== PREDICTIONS ===");
    let p = &report.predictions;
    println!(
        "  improving: {} | declining: {} | unclassified: {} | avg confidence: {:.2}",
        p.improving, p.declining, p.unclassified, p.average_confidence
    );

    if !report.extremes.is_empty() {
        println!();
        println!("=== COMPARISONS ===");
        for e in &report.extremes {
            println!(
                "  {} | high: {} ({:.1}) | low: {} ({:.1}) | widest gap: {} ({:+.1})",
                e.largest_gap.comparison.metric,
                e.highest.label,
                e.highest.value,
                e.lowest.label,
                e.lowest.value,
                e.largest_gap.label,
                e.largest_gap.difference
            );
        }
    }

    println!();
    println!("=== ITEMS ({}) ===", report.items.len());
    for item in &report.items {
        println!(
            "  {:<10} {:<40} {:>6.1}% | {} | {}",
            item.id, item.name, item.compliance_rate, item.status, item.risk_level
        );
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

fn parse_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
