#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived statistics for one region and year.
//!
//! A [`YearSnapshot`] is computed on demand from raw records and is never
//! stored as source truth. A [`ComparisonResult`] pairs two snapshots of
//! the same region with per-metric deltas.

pub mod comparison;
pub mod value;

pub use comparison::{ComparisonResult, MetricDelta};
pub use value::MetricValue;

use serde::{Deserialize, Serialize};
use statline_dataset_models::DatasetKind;
use statline_region_models::{RegionLevel, RegionSummary};
use strum_macros::{AsRefStr, Display, EnumString};

/// Population-dynamics figures, raw and derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationFigures {
    /// Inhabitants on January 1st.
    pub population: MetricValue,
    /// Live births during the year.
    pub births: MetricValue,
    /// Deaths during the year.
    pub deaths: MetricValue,
    /// Arrivals from abroad.
    pub immigration: MetricValue,
    /// Departures abroad.
    pub emigration: MetricValue,
    /// Moves into the region from other municipalities.
    pub internal_migration_in: MetricValue,
    /// Moves out of the region to other municipalities.
    pub internal_migration_out: MetricValue,
    /// Land area in square kilometres.
    pub area_km2: MetricValue,
    /// Inhabitants per square kilometre.
    pub density: MetricValue,
    /// Births minus deaths.
    pub natural_change: MetricValue,
    /// Immigration minus emigration.
    pub migration_balance: MetricValue,
    /// Internal inbound minus outbound moves.
    pub internal_migration_net: MetricValue,
    /// Natural change plus both migration balances.
    pub total_change: MetricValue,
}

/// Violent-crime figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeFigures {
    /// Murder and manslaughter victims.
    pub victims: MetricValue,
    /// Victims per million inhabitants, recomputed from counts.
    pub rate_per_million: MetricValue,
    /// Rate per million as published with the table, for cross-checking.
    pub published_rate_per_million: MetricValue,
    /// Which series supplied the rate's denominator.
    pub rate_population_source: Option<DatasetKind>,
    /// Victims by method of killing.
    pub by_method: Distribution,
    /// Victims by age group.
    pub by_age_group: Distribution,
    /// Victims by type of crime scene.
    pub by_location: Distribution,
    /// Victims by sex.
    pub by_sex: Distribution,
}

/// Percentage breakdown of a count over its sub-categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    /// Sum of the sub-category counts.
    pub total: MetricValue,
    /// Sub-categories in label order.
    pub shares: Vec<Share>,
}

impl Distribution {
    /// A distribution with no sub-categories.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total: MetricValue::NotApplicable,
            shares: Vec::new(),
        }
    }
}

/// One sub-category of a [`Distribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    /// Sub-category label (e.g. "Stabbing", "MALE").
    pub label: String,
    /// Count for this sub-category.
    pub count: MetricValue,
    /// Percentage of the distribution total (0-100).
    pub percent: MetricValue,
}

/// Why a metric could not be computed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    /// No rows exist for the region/year in the source dataset.
    NoData,
    /// The source cell was suppressed or missing.
    MissingSourceValue,
    /// An operand of the formula is unavailable.
    MissingInput,
    /// No land area is known for the region.
    MissingArea,
    /// No matching population exists for the rate denominator.
    PopulationUnavailable,
    /// A published ratio cannot be summed across regions.
    NotAdditive,
}

/// Additional context attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotNote {
    /// A metric reports `Unavailable`.
    #[serde(rename_all = "camelCase")]
    MetricUnavailable {
        metric: SnapshotMetric,
        reason: UnavailableReason,
    },
    /// A dataset's figures were summed from a lower level.
    #[serde(rename_all = "camelCase")]
    AggregatedFrom {
        dataset: DatasetKind,
        level: RegionLevel,
        regions: usize,
    },
    /// The crime rate used the long-running population series.
    #[serde(rename_all = "camelCase")]
    RateFromSecondaryPopulation { population: f64 },
    /// National internal migration does not net to zero.
    #[serde(rename_all = "camelCase")]
    InternalMigrationImbalance { net: f64 },
}

/// Every scalar metric a snapshot exposes, in presentation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotMetric {
    /// [`PopulationFigures::population`].
    Population,
    /// [`PopulationFigures::births`].
    Births,
    /// [`PopulationFigures::deaths`].
    Deaths,
    /// [`PopulationFigures::immigration`].
    Immigration,
    /// [`PopulationFigures::emigration`].
    Emigration,
    /// [`PopulationFigures::internal_migration_in`].
    InternalMigrationIn,
    /// [`PopulationFigures::internal_migration_out`].
    InternalMigrationOut,
    /// [`PopulationFigures::area_km2`].
    AreaKm2,
    /// [`PopulationFigures::density`].
    Density,
    /// [`PopulationFigures::natural_change`].
    NaturalChange,
    /// [`PopulationFigures::migration_balance`].
    MigrationBalance,
    /// [`PopulationFigures::internal_migration_net`].
    InternalMigrationNet,
    /// [`PopulationFigures::total_change`].
    TotalChange,
    /// [`CrimeFigures::victims`].
    Victims,
    /// [`CrimeFigures::rate_per_million`].
    RatePerMillion,
    /// [`CrimeFigures::published_rate_per_million`].
    PublishedRatePerMillion,
}

impl SnapshotMetric {
    /// All metrics in presentation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Population,
            Self::Births,
            Self::Deaths,
            Self::Immigration,
            Self::Emigration,
            Self::InternalMigrationIn,
            Self::InternalMigrationOut,
            Self::AreaKm2,
            Self::Density,
            Self::NaturalChange,
            Self::MigrationBalance,
            Self::InternalMigrationNet,
            Self::TotalChange,
            Self::Victims,
            Self::RatePerMillion,
            Self::PublishedRatePerMillion,
        ]
    }
}

/// All statistics for one region in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    /// The region the figures describe.
    pub region: RegionSummary,
    /// Reporting year.
    pub year: i32,
    /// Population-dynamics figures.
    pub population: PopulationFigures,
    /// Violent-crime figures.
    pub crime: CrimeFigures,
    /// Unavailable metrics, aggregation sources and invariant notes.
    pub notes: Vec<SnapshotNote>,
}

impl YearSnapshot {
    /// Reads one scalar metric.
    #[must_use]
    pub const fn metric(&self, metric: SnapshotMetric) -> MetricValue {
        let p = &self.population;
        let c = &self.crime;
        match metric {
            SnapshotMetric::Population => p.population,
            SnapshotMetric::Births => p.births,
            SnapshotMetric::Deaths => p.deaths,
            SnapshotMetric::Immigration => p.immigration,
            SnapshotMetric::Emigration => p.emigration,
            SnapshotMetric::InternalMigrationIn => p.internal_migration_in,
            SnapshotMetric::InternalMigrationOut => p.internal_migration_out,
            SnapshotMetric::AreaKm2 => p.area_km2,
            SnapshotMetric::Density => p.density,
            SnapshotMetric::NaturalChange => p.natural_change,
            SnapshotMetric::MigrationBalance => p.migration_balance,
            SnapshotMetric::InternalMigrationNet => p.internal_migration_net,
            SnapshotMetric::TotalChange => p.total_change,
            SnapshotMetric::Victims => c.victims,
            SnapshotMetric::RatePerMillion => c.rate_per_million,
            SnapshotMetric::PublishedRatePerMillion => c.published_rate_per_million,
        }
    }

    /// The reason recorded for an unavailable metric, if any.
    #[must_use]
    pub fn unavailable_reason(&self, metric: SnapshotMetric) -> Option<UnavailableReason> {
        self.notes.iter().find_map(|note| match note {
            SnapshotNote::MetricUnavailable { metric: m, reason } if *m == metric => Some(*reason),
            _ => None,
        })
    }
}
