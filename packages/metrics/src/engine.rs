//! Snapshot and comparison computation.

use std::sync::Arc;

use statline_dataset::RecordStore;
use statline_dataset_models::{Breakdown, Characteristic, DatasetKind, MetricName, Sex};
use statline_metrics_models::{
    ComparisonResult, CrimeFigures, MetricValue, PopulationFigures, SnapshotMetric, SnapshotNote,
    UnavailableReason, YearSnapshot,
};
use statline_region::RegionHierarchy;
use statline_region_models::{Region, RegionLevel, RegionSummary};

use crate::aggregate::{Aggregator, SourceLevel};
use crate::cache::SnapshotCache;
use crate::{MetricError, formulas};

/// Largest absolute national internal-migration net accepted as zero.
const IMBALANCE_TOLERANCE: f64 = 0.5;

/// Computes [`YearSnapshot`]s and [`ComparisonResult`]s over loaded data.
///
/// Holds shared, read-only references to the hierarchy and the record
/// store, so it is `Send + Sync` and can serve concurrent queries. With
/// memoization enabled every `(region, year)` snapshot is computed at most
/// once.
pub struct MetricEngine {
    hierarchy: Arc<RegionHierarchy>,
    store: Arc<RecordStore>,
    cache: Option<SnapshotCache>,
}

impl MetricEngine {
    /// Creates an engine without memoization.
    #[must_use]
    pub const fn new(hierarchy: Arc<RegionHierarchy>, store: Arc<RecordStore>) -> Self {
        Self {
            hierarchy,
            store,
            cache: None,
        }
    }

    /// Enables snapshot memoization.
    #[must_use]
    pub fn with_memoization(mut self) -> Self {
        self.cache = Some(SnapshotCache::new());
        self
    }

    /// The region hierarchy the engine reads from.
    #[must_use]
    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    /// The loaded records.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// The snapshot cache, when memoization is enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&SnapshotCache> {
        self.cache.as_ref()
    }

    /// Computes all statistics for one region and year.
    ///
    /// Metrics that cannot be computed are reported as
    /// [`MetricValue::Unavailable`] with a [`SnapshotNote`] giving the
    /// reason; only an unknown region fails the whole snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::Region`] if the code is not in the hierarchy.
    pub fn compute_snapshot(&self, code: &str, year: i32) -> Result<YearSnapshot, MetricError> {
        let region = self.hierarchy.resolve(code)?;
        Ok(match &self.cache {
            Some(cache) => {
                cache.get_or_compute(&region.code, year, || self.build_snapshot(region, year))
            }
            None => self.build_snapshot(region, year),
        })
    }

    /// Compares one region between two years.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::Region`] if the code is not in the hierarchy.
    pub fn compare_years(
        &self,
        code: &str,
        year_a: i32,
        year_b: i32,
    ) -> Result<ComparisonResult, MetricError> {
        let a = self.compute_snapshot(code, year_a)?;
        let b = self.compute_snapshot(code, year_b)?;
        Self::compare_snapshots(a, b)
    }

    /// Pairs two already computed snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::RegionMismatch`] if the snapshots describe
    /// different regions.
    pub fn compare_snapshots(
        a: YearSnapshot,
        b: YearSnapshot,
    ) -> Result<ComparisonResult, MetricError> {
        let (code_a, code_b) = (a.region.code.to_string(), b.region.code.to_string());
        ComparisonResult::from_snapshots(a, b).ok_or(MetricError::RegionMismatch {
            a: code_a,
            b: code_b,
        })
    }

    fn build_snapshot(&self, region: &Region, year: i32) -> YearSnapshot {
        let agg = Aggregator::new(&self.hierarchy, &self.store);
        let mut notes = Vec::new();

        let population = self.population_figures(&agg, region, year, &mut notes);
        let crime = self.crime_figures(&agg, region, year, population.population, &mut notes);

        YearSnapshot {
            region: RegionSummary::from(region),
            year,
            population,
            crime,
            notes,
        }
    }

    fn population_figures(
        &self,
        agg: &Aggregator<'_>,
        region: &Region,
        year: i32,
        notes: &mut Vec<SnapshotNote>,
    ) -> PopulationFigures {
        let kind = DatasetKind::PopulationDynamics;
        let source = agg.source_level(kind, region, year);
        note_aggregation(kind, &source, notes);

        let raw_reason = raw_reason(&source);
        let mut read = |metric: MetricName, snapshot_metric: SnapshotMetric| {
            let value = agg.value(kind, &region.code, &source, year, metric, &Breakdown::TOTAL);
            note_if_unavailable(notes, snapshot_metric, value, raw_reason);
            value
        };

        let population = read(MetricName::Population, SnapshotMetric::Population);
        let births = read(MetricName::Births, SnapshotMetric::Births);
        let deaths = read(MetricName::Deaths, SnapshotMetric::Deaths);
        let immigration = read(MetricName::Immigration, SnapshotMetric::Immigration);
        let emigration = read(MetricName::Emigration, SnapshotMetric::Emigration);
        let internal_migration_in = read(
            MetricName::InternalMigrationIn,
            SnapshotMetric::InternalMigrationIn,
        );
        let internal_migration_out = read(
            MetricName::InternalMigrationOut,
            SnapshotMetric::InternalMigrationOut,
        );

        let area = self
            .hierarchy
            .area_km2(region.code.as_str())
            .ok()
            .flatten();
        let area_km2 = MetricValue::from_option(area);
        note_if_unavailable(
            notes,
            SnapshotMetric::AreaKm2,
            area_km2,
            UnavailableReason::MissingArea,
        );

        let density = scoped(
            notes,
            SnapshotMetric::Density,
            formulas::density(&region.code, population, area),
        );

        let natural_change = derived(
            notes,
            SnapshotMetric::NaturalChange,
            formulas::natural_change(births, deaths),
        );
        let migration_balance = derived(
            notes,
            SnapshotMetric::MigrationBalance,
            formulas::migration_balance(immigration, emigration),
        );
        let internal_migration_net = derived(
            notes,
            SnapshotMetric::InternalMigrationNet,
            formulas::internal_migration_net(internal_migration_in, internal_migration_out),
        );
        let total_change = derived(
            notes,
            SnapshotMetric::TotalChange,
            formulas::total_change(natural_change, migration_balance, internal_migration_net),
        );

        if region.level == RegionLevel::National
            && let Some(net) = internal_migration_net.value()
            && net.abs() > IMBALANCE_TOLERANCE
        {
            log::warn!("National internal migration for {year} nets to {net} instead of zero");
            notes.push(SnapshotNote::InternalMigrationImbalance { net });
        }

        PopulationFigures {
            population,
            births,
            deaths,
            immigration,
            emigration,
            internal_migration_in,
            internal_migration_out,
            area_km2,
            density,
            natural_change,
            migration_balance,
            internal_migration_net,
            total_change,
        }
    }

    fn crime_figures(
        &self,
        agg: &Aggregator<'_>,
        region: &Region,
        year: i32,
        population: MetricValue,
        notes: &mut Vec<SnapshotNote>,
    ) -> CrimeFigures {
        let kind = DatasetKind::ViolentCrime;
        let code = &region.code;
        let source = agg.source_level(kind, region, year);
        note_aggregation(kind, &source, notes);

        let victims = agg.value(kind, code, &source, year, MetricName::Victims, &Breakdown::TOTAL);
        note_if_unavailable(notes, SnapshotMetric::Victims, victims, raw_reason(&source));

        let published_reason = match source {
            SourceLevel::Descendants { .. } => UnavailableReason::NotAdditive,
            SourceLevel::Own | SourceLevel::Missing => raw_reason(&source),
        };
        let published_rate_per_million = agg.value(
            kind,
            code,
            &source,
            year,
            MetricName::PublishedVictimRate,
            &Breakdown::TOTAL,
        );
        note_if_unavailable(
            notes,
            SnapshotMetric::PublishedRatePerMillion,
            published_rate_per_million,
            published_reason,
        );

        let (denominator, denominator_source) =
            self.rate_population(agg, region, year, population, notes);
        let rate_per_million = scoped(
            notes,
            SnapshotMetric::RatePerMillion,
            formulas::rate_per_million(code, year, victims, denominator),
        );

        let mut by_method = Vec::new();
        let mut by_age_group = Vec::new();
        let mut by_location = Vec::new();
        let mut by_sex = Vec::new();
        for breakdown in agg.breakdowns(kind, code, &source, year, MetricName::Victims) {
            let count = agg.value(kind, code, &source, year, MetricName::Victims, &breakdown);
            match (breakdown.sex, breakdown.characteristic) {
                (Sex::Total, Characteristic::Method(label)) => by_method.push((label, count)),
                (Sex::Total, Characteristic::AgeGroup(label)) => by_age_group.push((label, count)),
                (Sex::Total, Characteristic::Location(label)) => by_location.push((label, count)),
                (sex, Characteristic::Total) if sex != Sex::Total => {
                    by_sex.push((sex.to_string(), count));
                }
                _ => {}
            }
        }

        CrimeFigures {
            victims,
            rate_per_million,
            published_rate_per_million,
            rate_population_source: denominator.is_value().then_some(denominator_source),
            by_method: formulas::distribution(by_method),
            by_age_group: formulas::distribution(by_age_group),
            by_location: formulas::distribution(by_location),
            by_sex: formulas::distribution(by_sex),
        }
    }

    /// Picks the population used as the rate denominator.
    ///
    /// Years outside the population-dynamics coverage fall back to the
    /// long-running series when it is loaded.
    fn rate_population(
        &self,
        agg: &Aggregator<'_>,
        region: &Region,
        year: i32,
        population: MetricValue,
        notes: &mut Vec<SnapshotNote>,
    ) -> (MetricValue, DatasetKind) {
        let primary = DatasetKind::PopulationDynamics;
        let secondary = DatasetKind::PopulationHistory;

        let primary_covers = self
            .store
            .coverage(primary)
            .is_some_and(|coverage| coverage.contains(year));
        if primary_covers || !self.store.has_dataset(secondary) {
            return (population, primary);
        }

        let source = agg.source_level(secondary, region, year);
        let fallback = agg.value(
            secondary,
            &region.code,
            &source,
            year,
            MetricName::Population,
            &Breakdown::TOTAL,
        );
        match fallback.value() {
            Some(value) => {
                log::debug!(
                    "{} {year}: rate uses secondary population {value}",
                    region.code
                );
                notes.push(SnapshotNote::RateFromSecondaryPopulation { population: value });
                (fallback, secondary)
            }
            None => (population, primary),
        }
    }
}

const fn raw_reason(source: &SourceLevel) -> UnavailableReason {
    match source {
        SourceLevel::Missing => UnavailableReason::NoData,
        SourceLevel::Own | SourceLevel::Descendants { .. } => UnavailableReason::MissingSourceValue,
    }
}

fn note_aggregation(kind: DatasetKind, source: &SourceLevel, notes: &mut Vec<SnapshotNote>) {
    if let SourceLevel::Descendants { level, regions } = source {
        notes.push(SnapshotNote::AggregatedFrom {
            dataset: kind,
            level: *level,
            regions: regions.len(),
        });
    }
}

fn note_if_unavailable(
    notes: &mut Vec<SnapshotNote>,
    metric: SnapshotMetric,
    value: MetricValue,
    reason: UnavailableReason,
) {
    if value.is_unavailable() {
        notes.push(SnapshotNote::MetricUnavailable { metric, reason });
    }
}

fn derived(
    notes: &mut Vec<SnapshotNote>,
    metric: SnapshotMetric,
    value: MetricValue,
) -> MetricValue {
    note_if_unavailable(notes, metric, value, UnavailableReason::MissingInput);
    value
}

/// Unwraps a formula scoped to one metric, recording why it failed.
fn scoped(
    notes: &mut Vec<SnapshotNote>,
    metric: SnapshotMetric,
    result: Result<MetricValue, MetricError>,
) -> MetricValue {
    match result {
        Ok(value) => derived(notes, metric, value),
        Err(e) => {
            log::debug!("{metric} unavailable: {e}");
            notes.push(SnapshotNote::MetricUnavailable {
                metric,
                reason: e.reason(),
            });
            MetricValue::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{crime_csv, hierarchy, population_csv, store, store_with};

    fn engine() -> MetricEngine {
        let h = hierarchy();
        let s = store(&h);
        MetricEngine::new(Arc::new(h), Arc::new(s))
    }

    fn value(v: MetricValue) -> f64 {
        v.value().unwrap_or_else(|| panic!("expected a value, got {v:?}"))
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetricEngine>();
    }

    #[test]
    fn national_natural_change() {
        let engine = engine();
        let s22 = engine.compute_snapshot("NL01", 2022).unwrap();
        let s23 = engine.compute_snapshot("NL01", 2023).unwrap();
        assert_eq!(s22.population.natural_change, MetricValue::Value(-2_608.0));
        assert_eq!(s23.population.natural_change, MetricValue::Value(-5_034.0));
    }

    #[test]
    fn national_rates_use_matching_population() {
        let engine = engine();

        let s01 = engine.compute_snapshot("NL01", 2001).unwrap();
        assert_eq!(s01.crime.victims, MetricValue::Value(264.0));
        let expected = 264.0 / 15_987_075.0 * 1_000_000.0;
        assert!((value(s01.crime.rate_per_million) - expected).abs() < 1e-9);
        assert_eq!(
            s01.crime.rate_population_source,
            Some(DatasetKind::PopulationHistory)
        );
        assert!(
            s01.notes
                .iter()
                .any(|n| matches!(n, SnapshotNote::RateFromSecondaryPopulation { .. }))
        );

        let s23 = engine.compute_snapshot("NL01", 2023).unwrap();
        assert_eq!(s23.crime.victims, MetricValue::Value(125.0));
        let expected = 125.0 / 17_811_291.0 * 1_000_000.0;
        assert!((value(s23.crime.rate_per_million) - expected).abs() < 1e-9);
        assert_eq!(
            s23.crime.rate_population_source,
            Some(DatasetKind::PopulationDynamics)
        );
        assert!((value(s23.crime.published_rate_per_million) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn pre_coverage_rate_without_secondary_series_is_unavailable() {
        let h = hierarchy();
        let s = store_with(
            &h,
            &[
                (DatasetKind::PopulationDynamics, population_csv()),
                (DatasetKind::ViolentCrime, crime_csv()),
            ],
        );
        let engine = MetricEngine::new(Arc::new(h), Arc::new(s));
        let snapshot = engine.compute_snapshot("NL01", 2001).unwrap();
        assert_eq!(snapshot.crime.victims, MetricValue::Value(264.0));
        assert_eq!(snapshot.crime.rate_per_million, MetricValue::Unavailable);
        assert_eq!(
            snapshot.unavailable_reason(SnapshotMetric::RatePerMillion),
            Some(UnavailableReason::PopulationUnavailable)
        );
        assert_eq!(snapshot.crime.rate_population_source, None);
    }

    #[test]
    fn doubling_population_halves_rate() {
        let h = hierarchy();
        let doubled_csv = population_csv().replace("NL01,2023,17811291", "NL01,2023,35622582");
        let s = store_with(
            &h,
            &[
                (DatasetKind::PopulationDynamics, &doubled_csv),
                (DatasetKind::ViolentCrime, crime_csv()),
            ],
        );
        let doubled = MetricEngine::new(Arc::new(h), Arc::new(s));

        let base = value(engine().compute_snapshot("NL01", 2023).unwrap().crime.rate_per_million);
        let half = value(doubled.compute_snapshot("NL01", 2023).unwrap().crime.rate_per_million);
        assert!((base / 2.0 - half).abs() < 1e-9);
    }

    #[test]
    fn province_population_equals_sum_of_municipalities() {
        let engine = engine();
        let province = engine.compute_snapshot("PV27", 2022).unwrap();
        let sum: f64 = engine
            .hierarchy()
            .descendants("PV27", RegionLevel::Municipality)
            .unwrap()
            .iter()
            .map(|m| {
                let snapshot = engine.compute_snapshot(m.code.as_str(), 2022).unwrap();
                value(snapshot.population.population)
            })
            .sum();
        assert!((value(province.population.population) - sum).abs() < 0.5);
        assert!(province.notes.contains(&SnapshotNote::AggregatedFrom {
            dataset: DatasetKind::PopulationDynamics,
            level: RegionLevel::Municipality,
            regions: 4,
        }));
    }

    #[test]
    fn missing_cell_propagates_as_unavailable() {
        let engine = engine();
        let snapshot = engine.compute_snapshot("GM0437", 2023).unwrap();
        let p = &snapshot.population;
        assert_eq!(p.births, MetricValue::Unavailable);
        assert_eq!(p.natural_change, MetricValue::Unavailable);
        assert_eq!(p.total_change, MetricValue::Unavailable);
        assert!(p.migration_balance.is_value());
        assert_eq!(
            snapshot.unavailable_reason(SnapshotMetric::Births),
            Some(UnavailableReason::MissingSourceValue)
        );
        assert_eq!(
            snapshot.unavailable_reason(SnapshotMetric::NaturalChange),
            Some(UnavailableReason::MissingInput)
        );
    }

    #[test]
    fn density_without_area_is_unavailable() {
        let engine = engine();
        for code in ["GM0437", "CR23"] {
            let snapshot = engine.compute_snapshot(code, 2022).unwrap();
            assert_eq!(snapshot.population.density, MetricValue::Unavailable, "{code}");
            assert_eq!(
                snapshot.unavailable_reason(SnapshotMetric::Density),
                Some(UnavailableReason::MissingArea)
            );
        }

        let amsterdam = engine.compute_snapshot("GM0363", 2022).unwrap();
        let expected = 882_633.0 / 164.87;
        assert!((value(amsterdam.population.density) - expected).abs() < 1e-6);
    }

    #[test]
    fn region_without_crime_rows_reports_no_data() {
        let engine = engine();
        let snapshot = engine.compute_snapshot("GM0014", 2023).unwrap();
        assert_eq!(snapshot.crime.victims, MetricValue::Unavailable);
        assert_eq!(
            snapshot.unavailable_reason(SnapshotMetric::Victims),
            Some(UnavailableReason::NoData)
        );
        assert!(snapshot.crime.by_method.shares.is_empty());
    }

    #[test]
    fn distributions_sum_to_hundred() {
        let engine = engine();
        let crime = engine.compute_snapshot("NL01", 2023).unwrap().crime;
        for dist in [&crime.by_method, &crime.by_age_group, &crime.by_location, &crime.by_sex] {
            assert_eq!(dist.total, MetricValue::Value(125.0));
            let sum: f64 = dist.shares.iter().map(|s| value(s.percent)).sum();
            assert!((sum - 100.0).abs() < 0.01);
        }
        let male = crime.by_sex.shares.iter().find(|s| s.label == "MALE").unwrap();
        assert!((value(male.percent) - 64.0).abs() < 1e-9);
    }

    #[test]
    fn province_crime_is_recomputed_from_municipality_sums() {
        let engine = engine();
        let snapshot = engine.compute_snapshot("PV27", 2023).unwrap();
        let crime = &snapshot.crime;

        assert_eq!(crime.victims, MetricValue::Value(23.0));
        let expected = 23.0 / 1_189_808.0 * 1_000_000.0;
        assert!((value(crime.rate_per_million) - expected).abs() < 1e-9);
        assert_eq!(crime.rate_population_source, Some(DatasetKind::PopulationDynamics));

        assert_eq!(crime.published_rate_per_million, MetricValue::Unavailable);
        assert_eq!(
            snapshot.unavailable_reason(SnapshotMetric::PublishedRatePerMillion),
            Some(UnavailableReason::NotAdditive)
        );
        assert!(snapshot.notes.contains(&SnapshotNote::AggregatedFrom {
            dataset: DatasetKind::ViolentCrime,
            level: RegionLevel::Municipality,
            regions: 4,
        }));

        assert_eq!(crime.by_method.total, MetricValue::Value(23.0));
        let labels: Vec<&str> = crime.by_method.shares.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Shooting", "Stabbing"]);
        let sum: f64 = crime.by_method.shares.iter().map(|s| value(s.percent)).sum();
        assert!((sum - 100.0).abs() < 0.01);
        let stabbing = &crime.by_method.shares[1];
        assert_eq!(stabbing.count, MetricValue::Value(15.0));
        assert!((value(stabbing.percent) - 15.0 / 23.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn municipality_reads_its_own_published_rate() {
        let snapshot = engine().compute_snapshot("GM0363", 2023).unwrap();
        assert_eq!(snapshot.crime.victims, MetricValue::Value(18.0));
        assert!((value(snapshot.crime.published_rate_per_million) - 19.6).abs() < 1e-9);
        assert!(
            !snapshot
                .notes
                .iter()
                .any(|n| matches!(n, SnapshotNote::AggregatedFrom { .. }))
        );
    }

    #[test]
    fn self_comparison_has_zero_deltas() {
        let engine = engine();
        let cmp = engine.compare_years("NL01", 2023, 2023).unwrap();
        assert_eq!(cmp.deltas.len(), SnapshotMetric::all().len());
        for delta in &cmp.deltas {
            assert_eq!(delta.absolute, MetricValue::Value(0.0), "{}", delta.metric);
            assert!(
                delta.percent_change == MetricValue::Value(0.0)
                    || delta.percent_change.is_not_applicable(),
                "{}",
                delta.metric
            );
        }
    }

    #[test]
    fn year_over_year_victim_change() {
        let engine = engine();
        let cmp = engine.compare_years("NL01", 2022, 2023).unwrap();
        let victims = cmp.delta(SnapshotMetric::Victims).unwrap();
        assert_eq!(victims.absolute, MetricValue::Value(7.0));
        assert!((value(victims.percent_change) - 7.0 / 118.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn comparing_different_regions_fails() {
        let engine = engine();
        let a = engine.compute_snapshot("NL01", 2023).unwrap();
        let b = engine.compute_snapshot("GM0363", 2023).unwrap();
        assert!(matches!(
            MetricEngine::compare_snapshots(a, b),
            Err(MetricError::RegionMismatch { .. })
        ));
    }

    #[test]
    fn unknown_region_fails_snapshot() {
        assert!(matches!(
            engine().compute_snapshot("GM9999", 2023),
            Err(MetricError::Region(_))
        ));
    }

    #[test]
    fn national_internal_migration_imbalance_is_noted() {
        let h = hierarchy();
        let csv = population_csv().replace(
            "NL01,2023,17811291,163977,169011,331138,196221,612334,612334",
            "NL01,2023,17811291,163977,169011,331138,196221,612334,612000",
        );
        let s = store_with(&h, &[(DatasetKind::PopulationDynamics, &csv)]);
        let engine = MetricEngine::new(Arc::new(h), Arc::new(s));

        let snapshot = engine.compute_snapshot("NL01", 2023).unwrap();
        assert!(
            snapshot
                .notes
                .contains(&SnapshotNote::InternalMigrationImbalance { net: 334.0 })
        );
        let balanced = engine.compute_snapshot("NL01", 2022).unwrap();
        assert!(
            !balanced
                .notes
                .iter()
                .any(|n| matches!(n, SnapshotNote::InternalMigrationImbalance { .. }))
        );
    }

    #[test]
    fn memoized_snapshot_is_computed_once_under_contention() {
        let engine = engine().with_memoization();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let snapshot = engine.compute_snapshot("nl01", 2023).unwrap();
                    assert_eq!(snapshot.crime.victims, MetricValue::Value(125.0));
                });
            }
        });
        let cache = engine.cache().unwrap();
        assert_eq!(cache.computations(), 1);
        assert_eq!(cache.len(), 1);

        engine.compute_snapshot("NL01", 2022).unwrap();
        assert_eq!(cache.computations(), 2);
    }
}
