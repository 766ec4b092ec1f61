//! In-memory record store partitioned by dataset, region and year.
//!
//! Built once at startup and read-only afterwards. Every lookup the metric
//! engine performs is a pair of ordered-map lookups, and iteration order is
//! deterministic.

use std::collections::BTreeMap;

use statline_dataset_models::{Breakdown, DatasetKind, MetricName, RawRecord, YearCoverage};
use statline_region_models::RegionCode;

type Partition = BTreeMap<(MetricName, Breakdown), RawRecord>;

/// Loaded source records for all datasets.
#[derive(Debug, Default)]
pub struct RecordStore {
    partitions: BTreeMap<(DatasetKind, RegionCode, i32), Partition>,
    coverage: BTreeMap<DatasetKind, YearCoverage>,
    record_count: usize,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the records of one dataset along with its coverage window.
    ///
    /// The loader has already rejected duplicate keys within a dataset;
    /// inserting the same dataset twice replaces overlapping records.
    pub fn insert_dataset(
        &mut self,
        kind: DatasetKind,
        coverage: YearCoverage,
        records: Vec<RawRecord>,
    ) {
        let count = records.len();
        for record in records {
            let partition = self
                .partitions
                .entry((kind, record.region_code.clone(), record.year))
                .or_default();
            if partition
                .insert((record.metric, record.breakdown.clone()), record)
                .is_none()
            {
                self.record_count += 1;
            }
        }
        self.coverage.insert(kind, coverage);
        log::info!("Indexed {count} {kind} records (coverage {coverage})");
    }

    /// Looks up a single observation.
    #[must_use]
    pub fn get(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        year: i32,
        metric: MetricName,
        breakdown: &Breakdown,
    ) -> Option<&RawRecord> {
        self.partitions
            .get(&(kind, region.clone(), year))?
            .get(&(metric, breakdown.clone()))
    }

    /// All records of `metric` for one region/year, in breakdown order.
    pub fn breakdowns(
        &self,
        kind: DatasetKind,
        region: &RegionCode,
        year: i32,
        metric: MetricName,
    ) -> impl Iterator<Item = &RawRecord> {
        self.partitions
            .get(&(kind, region.clone(), year))
            .into_iter()
            .flat_map(|partition| partition.values())
            .filter(move |record| record.metric == metric)
    }

    /// Whether any record exists for the region/year in `kind`.
    #[must_use]
    pub fn has_partition(&self, kind: DatasetKind, region: &RegionCode, year: i32) -> bool {
        self.partitions.contains_key(&(kind, region.clone(), year))
    }

    /// Coverage window of a loaded dataset.
    #[must_use]
    pub fn coverage(&self, kind: DatasetKind) -> Option<YearCoverage> {
        self.coverage.get(&kind).copied()
    }

    /// Whether `kind` has been loaded.
    #[must_use]
    pub fn has_dataset(&self, kind: DatasetKind) -> bool {
        self.coverage.contains_key(&kind)
    }

    /// Loaded datasets in a stable order.
    pub fn datasets(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.coverage.keys().copied()
    }

    /// Total number of stored records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.record_count
    }

    /// Whether no records are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
