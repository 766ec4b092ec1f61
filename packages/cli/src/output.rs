//! Text rendering for listings and bundle summaries.

use statline_metrics_models::{Distribution, SnapshotMetric, SnapshotNote, YearSnapshot};
use statline_query::{QueryFacade, StatisticsBundle};
use statline_region_models::RegionSummary;

const RULE_WIDTH: usize = 60;

/// Prints regions as an aligned `CODE LEVEL NAME` table.
pub fn print_regions(regions: impl IntoIterator<Item = RegionSummary>) {
    println!("{:<8} {:<14} NAME", "CODE", "LEVEL");
    println!("{}", "-".repeat(RULE_WIDTH));
    for region in regions {
        println!(
            "{:<8} {:<14} {}",
            region.code.as_str(),
            region.level.as_ref(),
            region.name
        );
    }
}

/// Prints what the facade loaded.
pub fn print_validation(facade: &QueryFacade) {
    let engine = facade.engine();
    println!("Regions:  {}", facade.hierarchy().len());
    println!("Records:  {}", engine.store().len());
    for kind in engine.store().datasets() {
        if let Some(coverage) = engine.store().coverage(kind) {
            println!("  {:<22} {coverage}", kind.as_ref());
        }
    }
    match facade.coverage() {
        Some(coverage) => println!("Queryable years: {coverage}"),
        None => println!("Queryable years: none (no datasets configured)"),
    }
}

/// Prints a human-readable summary of a bundle.
pub fn print_bundle_summary(bundle: &StatisticsBundle) {
    let breadcrumb: Vec<&str> = bundle
        .ancestors
        .iter()
        .rev()
        .map(|r| r.name.as_str())
        .chain(std::iter::once(bundle.region.name.as_str()))
        .collect();
    println!(
        "{} ({}, {})",
        breadcrumb.join(" > "),
        bundle.region.code,
        bundle.region.level
    );
    println!("Selection: {}", bundle.selection);
    println!("{}", "=".repeat(RULE_WIDTH));

    for snapshot in &bundle.snapshots {
        print_snapshot(snapshot);
    }

    if let Some(comparison) = &bundle.comparison {
        println!("Change {} -> {}", comparison.year_a, comparison.year_b);
        println!("{}", "-".repeat(RULE_WIDTH));
        for delta in &comparison.deltas {
            println!(
                "  {:<28} {:>14} {:>10}",
                delta.metric.to_string(),
                delta.absolute.to_string(),
                format!("{}%", delta.percent_change)
            );
        }
        println!();
    }

    if let Some(trend) = &bundle.trend {
        println!("Trend {}-{}", trend.first_year, trend.last_year);
        println!("{}", "-".repeat(RULE_WIDTH));
        if let Some(peak) = trend.peak_victims {
            println!("  Most victims:  {} ({})", peak.value, peak.year);
        }
        if let Some(trough) = trend.trough_victims {
            println!("  Fewest victims: {} ({})", trough.value, trough.year);
        }
        println!("  Total victims: {}", trend.total_victims);
        println!("  Population change: {}", trend.population_change.absolute);
    }
}

fn print_snapshot(snapshot: &YearSnapshot) {
    println!("{}", snapshot.year);
    println!("{}", "-".repeat(RULE_WIDTH));
    for &metric in SnapshotMetric::all() {
        println!("  {:<28} {:>14}", metric.to_string(), snapshot.metric(metric).to_string());
    }
    print_distribution("Method", &snapshot.crime.by_method);
    print_distribution("Age group", &snapshot.crime.by_age_group);
    print_distribution("Location", &snapshot.crime.by_location);
    print_distribution("Sex", &snapshot.crime.by_sex);

    for note in &snapshot.notes {
        match note {
            SnapshotNote::MetricUnavailable { .. } => {}
            SnapshotNote::AggregatedFrom {
                dataset,
                level,
                regions,
            } => println!("  note: {dataset} summed over {regions} {level} regions"),
            SnapshotNote::RateFromSecondaryPopulation { population } => {
                println!("  note: rate uses long-running population series ({population})");
            }
            SnapshotNote::InternalMigrationImbalance { net } => {
                println!("  note: national internal migration nets to {net}");
            }
        }
    }
    println!();
}

fn print_distribution(title: &str, distribution: &Distribution) {
    if distribution.shares.is_empty() {
        return;
    }
    println!("  {title}:");
    for share in &distribution.shares {
        println!(
            "    {:<26} {:>8} {:>8}%",
            share.label,
            share.count.to_string(),
            share.percent.to_string()
        );
    }
}
