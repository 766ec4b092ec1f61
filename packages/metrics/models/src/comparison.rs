//! Year-over-year comparison types.

use serde::{Deserialize, Serialize};
use statline_region_models::RegionSummary;

use crate::{MetricValue, SnapshotMetric, YearSnapshot};

/// Change in one metric between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDelta {
    /// The compared metric.
    pub metric: SnapshotMetric,
    /// Value in the first year.
    pub a: MetricValue,
    /// Value in the second year.
    pub b: MetricValue,
    /// `b - a`.
    pub absolute: MetricValue,
    /// `(b - a) / a * 100`; not applicable when `a` is zero.
    pub percent_change: MetricValue,
}

impl MetricDelta {
    /// Computes absolute and percentage change from `a` to `b`.
    #[must_use]
    pub fn between(metric: SnapshotMetric, a: MetricValue, b: MetricValue) -> Self {
        let absolute = b - a;
        let percent_change = absolute.ratio(a).map(|r| r * 100.0);
        Self {
            metric,
            a,
            b,
            absolute,
            percent_change,
        }
    }
}

/// Two snapshots of the same region with per-metric deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Region both snapshots describe.
    pub region: RegionSummary,
    /// Year of the baseline snapshot.
    pub year_a: i32,
    /// Year of the compared snapshot.
    pub year_b: i32,
    /// Baseline snapshot.
    pub snapshot_a: YearSnapshot,
    /// Compared snapshot.
    pub snapshot_b: YearSnapshot,
    /// One entry per [`SnapshotMetric`], in presentation order.
    pub deltas: Vec<MetricDelta>,
}

impl ComparisonResult {
    /// Pairs two snapshots.
    ///
    /// Returns `None` if they describe different regions.
    #[must_use]
    pub fn from_snapshots(snapshot_a: YearSnapshot, snapshot_b: YearSnapshot) -> Option<Self> {
        if snapshot_a.region.code != snapshot_b.region.code {
            return None;
        }

        let deltas = SnapshotMetric::all()
            .iter()
            .map(|&metric| {
                MetricDelta::between(metric, snapshot_a.metric(metric), snapshot_b.metric(metric))
            })
            .collect();

        Some(Self {
            region: snapshot_a.region.clone(),
            year_a: snapshot_a.year,
            year_b: snapshot_b.year,
            snapshot_a,
            snapshot_b,
            deltas,
        })
    }

    /// Looks up the delta for one metric.
    #[must_use]
    pub fn delta(&self, metric: SnapshotMetric) -> Option<&MetricDelta> {
        self.deltas.iter().find(|d| d.metric == metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_is_relative_to_first_value() {
        let d = MetricDelta::between(
            SnapshotMetric::Victims,
            MetricValue::Value(118.0),
            MetricValue::Value(125.0),
        );
        assert_eq!(d.absolute, MetricValue::Value(7.0));
        let pct = d.percent_change.value().unwrap();
        assert!((pct - 5.932_203).abs() < 1e-5);
    }

    #[test]
    fn zero_base_gives_not_applicable_percent() {
        let d = MetricDelta::between(
            SnapshotMetric::InternalMigrationNet,
            MetricValue::Value(0.0),
            MetricValue::Value(12.0),
        );
        assert_eq!(d.absolute, MetricValue::Value(12.0));
        assert_eq!(d.percent_change, MetricValue::NotApplicable);
    }

    #[test]
    fn unavailable_side_gives_unavailable_delta() {
        let d = MetricDelta::between(
            SnapshotMetric::Births,
            MetricValue::Unavailable,
            MetricValue::Value(12.0),
        );
        assert_eq!(d.absolute, MetricValue::Unavailable);
        assert_eq!(d.percent_change, MetricValue::Unavailable);
    }
}
