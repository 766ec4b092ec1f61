//! Hierarchical aggregation of raw records.
//!
//! A region's figures for one dataset and year come from its own rows when
//! it has any. Otherwise levels below it are tried from the next level
//! down towards Municipality, and the first level at which *every*
//! descendant has rows is summed. Partial coverage is never summed, since
//! that would silently undercount.
//!
//! Within a summed level a descendant that publishes a total but no row
//! for some breakdown label contributes zero for that label. An explicit
//! missing cell still makes the sum `Unavailable`.

use std::collections::BTreeSet;

use statline_dataset::RecordStore;
use statline_dataset_models::{Breakdown, DatasetKind, MetricName};
use statline_metrics_models::MetricValue;
use statline_region::RegionHierarchy;
use statline_region_models::{Region, RegionCode, RegionLevel};

/// Where a dataset's figures for one region/year come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLevel {
    /// The region's own published rows.
    Own,
    /// Summed over every descendant at `level`.
    Descendants {
        level: RegionLevel,
        regions: Vec<RegionCode>,
    },
    /// No rows at any level.
    Missing,
}

/// Read-only view combining the hierarchy with the record store.
pub struct Aggregator<'a> {
    hierarchy: &'a RegionHierarchy,
    store: &'a RecordStore,
}

impl<'a> Aggregator<'a> {
    /// Creates an aggregator over loaded data.
    #[must_use]
    pub const fn new(hierarchy: &'a RegionHierarchy, store: &'a RecordStore) -> Self {
        Self { hierarchy, store }
    }

    /// Picks the level `kind` figures for `region` in `year` are read from.
    #[must_use]
    pub fn source_level(&self, kind: DatasetKind, region: &Region, year: i32) -> SourceLevel {
        if self.store.has_partition(kind, &region.code, year) {
            return SourceLevel::Own;
        }

        let mut next = region.level.child();
        while let Some(level) = next {
            let descendants = self
                .hierarchy
                .descendants(region.code.as_str(), level)
                .unwrap_or_default();
            if !descendants.is_empty()
                && descendants
                    .iter()
                    .all(|d| self.store.has_partition(kind, &d.code, year))
            {
                log::debug!(
                    "[{kind}] {} {year}: aggregating {} {level} regions",
                    region.code,
                    descendants.len()
                );
                return SourceLevel::Descendants {
                    level,
                    regions: descendants.into_iter().map(|d| d.code.clone()).collect(),
                };
            }
            next = level.child();
        }

        SourceLevel::Missing
    }

    /// Reads or sums one metric.
    ///
    /// A missing cell in any summed descendant makes the total
    /// `Unavailable`. Non-additive metrics are only read from own rows.
    /// A breakdown label absent from a descendant whose total is known
    /// counts as zero.
    #[must_use]
    pub fn value(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        source: &SourceLevel,
        year: i32,
        metric: MetricName,
        breakdown: &Breakdown,
    ) -> MetricValue {
        match source {
            SourceLevel::Own => self.cell(kind, region, year, metric, breakdown),
            SourceLevel::Descendants { regions, .. } if metric.is_additive() => MetricValue::sum(
                regions
                    .iter()
                    .map(|code| self.descendant_cell(kind, code, year, metric, breakdown)),
            ),
            SourceLevel::Descendants { .. } | SourceLevel::Missing => MetricValue::Unavailable,
        }
    }

    /// Every breakdown published for `metric` at the chosen source level,
    /// in breakdown order.
    #[must_use]
    pub fn breakdowns(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        source: &SourceLevel,
        year: i32,
        metric: MetricName,
    ) -> Vec<Breakdown> {
        match source {
            SourceLevel::Own => self
                .store
                .breakdowns(kind, region, year, metric)
                .map(|r| r.breakdown.clone())
                .collect(),
            SourceLevel::Descendants { regions, .. } => regions
                .iter()
                .flat_map(|code| self.store.breakdowns(kind, code, year, metric))
                .map(|r| r.breakdown.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            SourceLevel::Missing => Vec::new(),
        }
    }

    fn descendant_cell(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        year: i32,
        metric: MetricName,
        breakdown: &Breakdown,
    ) -> MetricValue {
        match self.store.get(kind, region, year, metric, breakdown) {
            Some(record) => MetricValue::from_option(record.value),
            None if *breakdown != Breakdown::TOTAL
                && self
                    .cell(kind, region, year, metric, &Breakdown::TOTAL)
                    .is_value() =>
            {
                MetricValue::Value(0.0)
            }
            None => MetricValue::Unavailable,
        }
    }

    fn cell(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        year: i32,
        metric: MetricName,
        breakdown: &Breakdown,
    ) -> MetricValue {
        self.store
            .get(kind, region, year, metric, breakdown)
            .map_or(MetricValue::Unavailable, |r| MetricValue::from_option(r.value))
    }
}
