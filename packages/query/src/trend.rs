//! Range trend summaries.

use statline_metrics_models::{MetricDelta, MetricValue, SnapshotMetric, YearSnapshot};
use statline_query_models::{TrendSummary, YearValue};

/// Summarizes a run of snapshots ordered by year.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn summarize(snapshots: &[YearSnapshot]) -> Option<TrendSummary> {
    let first = snapshots.first()?;
    let last = snapshots.last()?;

    let mut peak: Option<YearValue> = None;
    let mut trough: Option<YearValue> = None;
    for snapshot in snapshots {
        let Some(value) = snapshot.crime.victims.value() else {
            continue;
        };
        let point = YearValue {
            year: snapshot.year,
            value,
        };
        if peak.is_none_or(|p| value > p.value) {
            peak = Some(point);
        }
        if trough.is_none_or(|t| value < t.value) {
            trough = Some(point);
        }
    }

    Some(TrendSummary {
        first_year: first.year,
        last_year: last.year,
        peak_victims: peak,
        trough_victims: trough,
        total_victims: MetricValue::sum(snapshots.iter().map(|s| s.crime.victims)),
        population_change: MetricDelta::between(
            SnapshotMetric::Population,
            first.population.population,
            last.population.population,
        ),
    })
}
