//! The query entry point.

use std::sync::Arc;

use statline_dataset::progress::ProgressCallback;
use statline_dataset::registry::definition;
use statline_dataset::{RecordStore, SchemaLoader};
use statline_dataset_models::{DatasetKind, YearCoverage};
use statline_metrics::MetricEngine;
use statline_metrics_models::YearSnapshot;
use statline_query_models::{StatisticsBundle, StatlineConfig, YearSelection};
use statline_region::loader::load_hierarchy_from_path;
use statline_region::{RegionHierarchy, SearchIndex};
use statline_region_models::{Region, RegionLevel, RegionSummary};

use crate::{QueryError, trend};

/// Validates selections and assembles [`StatisticsBundle`]s.
///
/// Every operation is a pure function of the loaded data and its
/// arguments, so the same query always yields the same bundle.
pub struct QueryFacade {
    engine: MetricEngine,
    search: SearchIndex,
    coverage: Option<YearCoverage>,
}

impl QueryFacade {
    /// Builds a facade over already loaded data.
    #[must_use]
    pub fn new(hierarchy: Arc<RegionHierarchy>, store: Arc<RecordStore>, memoize: bool) -> Self {
        let search = SearchIndex::build(&hierarchy);
        let coverage = store
            .datasets()
            .filter(|kind| !kind.is_fallback_series())
            .filter_map(|kind| store.coverage(kind))
            .reduce(YearCoverage::union);

        let engine = MetricEngine::new(hierarchy, store);
        let engine = if memoize {
            engine.with_memoization()
        } else {
            engine
        };

        Self {
            engine,
            search,
            coverage,
        }
    }

    /// Loads the hierarchy and every configured dataset.
    ///
    /// `progress_for` supplies a progress reporter per dataset. Any load
    /// error aborts the bootstrap.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Hierarchy`] or [`QueryError::Load`] if a file
    /// is missing or invalid.
    pub fn from_config(
        config: &StatlineConfig,
        progress_for: impl Fn(DatasetKind) -> Arc<dyn ProgressCallback>,
    ) -> Result<Self, QueryError> {
        let hierarchy = load_hierarchy_from_path(&config.regions)?;

        let mut store = RecordStore::new();
        for (kind, path) in [
            (DatasetKind::PopulationDynamics, &config.population),
            (DatasetKind::ViolentCrime, &config.crime),
            (DatasetKind::PopulationHistory, &config.population_history),
        ] {
            let Some(path) = path else {
                log::info!("[{kind}] Not configured, skipping");
                continue;
            };
            let def = definition(kind);
            let records = SchemaLoader::new(&def, &hierarchy).load_path(path, &progress_for(kind))?;
            store.insert_dataset(kind, def.coverage(), records);
        }

        log::info!(
            "Loaded {} regions and {} records",
            hierarchy.len(),
            store.len()
        );
        Ok(Self::new(Arc::new(hierarchy), Arc::new(store), config.memoize))
    }

    /// Computes the statistics bundle for a region and year selection.
    ///
    /// A single year includes a comparison against the previous year when
    /// that year is covered. A range includes one snapshot per year, the
    /// first-versus-last comparison and a [`trend::summarize`] summary.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownRegion`] for an unknown code,
    /// [`QueryError::InvalidRange`] for an inverted range and
    /// [`QueryError::YearOutOfCoverage`] for an uncovered year.
    pub fn query(
        &self,
        code: &str,
        selection: YearSelection,
    ) -> Result<StatisticsBundle, QueryError> {
        let region = self.resolve(code)?;
        let coverage = self.validate(selection)?;
        let code = region.code.as_str();

        let snapshots = selection
            .years()
            .map(|year| self.engine.compute_snapshot(code, year))
            .collect::<Result<Vec<YearSnapshot>, _>>()?;

        let (comparison, trend) = match selection {
            YearSelection::Single { year } if coverage.contains(year - 1) => {
                let previous = self.engine.compute_snapshot(code, year - 1)?;
                let current = snapshots[0].clone();
                (Some(MetricEngine::compare_snapshots(previous, current)?), None)
            }
            YearSelection::Single { .. } => (None, None),
            YearSelection::Range { .. } => {
                let comparison = match (snapshots.first(), snapshots.last()) {
                    (Some(first), Some(last)) => Some(MetricEngine::compare_snapshots(
                        first.clone(),
                        last.clone(),
                    )?),
                    _ => None,
                };
                (comparison, trend::summarize(&snapshots))
            }
        };

        let hierarchy = self.engine.hierarchy();
        let summaries = |regions: Vec<&Region>| -> Vec<RegionSummary> {
            regions.into_iter().map(RegionSummary::from).collect()
        };

        Ok(StatisticsBundle {
            region: RegionSummary::from(region),
            selection,
            coverage,
            ancestors: summaries(hierarchy.ancestors(code)?),
            siblings: summaries(hierarchy.siblings(code)?),
            children: summaries(hierarchy.children(code)?),
            snapshots,
            comparison,
            trend,
        })
    }

    /// Name suggestions for region selection.
    #[must_use]
    pub fn search(&self, text: &str, limit: usize) -> Vec<Region> {
        self.search.suggest(text, limit)
    }

    /// Lists regions, optionally restricted to a level and/or to the
    /// descendants of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownRegion`] if `parent` is not found.
    pub fn regions(
        &self,
        level: Option<RegionLevel>,
        parent: Option<&str>,
    ) -> Result<Vec<RegionSummary>, QueryError> {
        let hierarchy = self.engine.hierarchy();
        let regions: Vec<&Region> = match (parent, level) {
            (Some(parent), Some(level)) => {
                self.resolve(parent)?;
                hierarchy.descendants(parent, level)?
            }
            (Some(parent), None) => {
                self.resolve(parent)?;
                hierarchy.children(parent)?
            }
            (None, Some(level)) => hierarchy.regions_at(level),
            (None, None) => hierarchy.iter().collect(),
        };
        Ok(regions.into_iter().map(RegionSummary::from).collect())
    }

    /// Union of the loaded datasets' coverage windows.
    #[must_use]
    pub const fn coverage(&self) -> Option<YearCoverage> {
        self.coverage
    }

    /// The loaded region hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &RegionHierarchy {
        self.engine.hierarchy()
    }

    /// The underlying metric engine.
    #[must_use]
    pub const fn engine(&self) -> &MetricEngine {
        &self.engine
    }

    fn resolve(&self, code: &str) -> Result<&Region, QueryError> {
        self.engine
            .hierarchy()
            .resolve(code)
            .map_err(|_| QueryError::UnknownRegion {
                code: code.trim().to_string(),
            })
    }

    fn validate(&self, selection: YearSelection) -> Result<YearCoverage, QueryError> {
        let coverage = self.coverage.ok_or(QueryError::NoData)?;
        if let YearSelection::Range { start, end } = selection
            && start > end
        {
            return Err(QueryError::InvalidRange { start, end });
        }
        for year in [selection.first(), selection.last()] {
            if !coverage.contains(year) {
                return Err(QueryError::YearOutOfCoverage { year, coverage });
            }
        }
        Ok(coverage)
    }
}
