#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query-facing types.
//!
//! A [`StatisticsBundle`] is everything the presentation layer needs to
//! render one selection: snapshots, the comparison, a trend summary, and
//! the navigation context around the selected region.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use statline_dataset_models::YearCoverage;
use statline_metrics_models::{ComparisonResult, MetricDelta, MetricValue, YearSnapshot};
use statline_region_models::RegionSummary;

/// The year or inclusive year range a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YearSelection {
    /// A single year.
    Single { year: i32 },
    /// Every year from `start` to `end`, inclusive.
    Range { start: i32, end: i32 },
}

impl YearSelection {
    /// First selected year.
    #[must_use]
    pub const fn first(self) -> i32 {
        match self {
            Self::Single { year } => year,
            Self::Range { start, .. } => start,
        }
    }

    /// Last selected year.
    #[must_use]
    pub const fn last(self) -> i32 {
        match self {
            Self::Single { year } => year,
            Self::Range { end, .. } => end,
        }
    }

    /// All selected years in ascending order.
    pub fn years(self) -> impl Iterator<Item = i32> {
        self.first()..=self.last()
    }
}

impl std::fmt::Display for YearSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single { year } => write!(f, "{year}"),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// A metric value tied to the year it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearValue {
    /// Year of the observation.
    pub year: i32,
    /// Observed value.
    pub value: f64,
}

/// Overall trend across a year range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    /// First year of the range.
    pub first_year: i32,
    /// Last year of the range.
    pub last_year: i32,
    /// Year with the most victims; the earliest wins a tie.
    pub peak_victims: Option<YearValue>,
    /// Year with the fewest victims; the earliest wins a tie.
    pub trough_victims: Option<YearValue>,
    /// Victims summed over the range.
    pub total_victims: MetricValue,
    /// Population change from the first to the last year.
    pub population_change: MetricDelta,
}

/// Fully computed response for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsBundle {
    /// The selected region.
    pub region: RegionSummary,
    /// The requested year or range.
    pub selection: YearSelection,
    /// Years covered by the loaded datasets.
    pub coverage: YearCoverage,
    /// Breadcrumb, from the immediate parent up to the National root.
    pub ancestors: Vec<RegionSummary>,
    /// Other regions under the same parent.
    pub siblings: Vec<RegionSummary>,
    /// Direct children for drill-down.
    pub children: Vec<RegionSummary>,
    /// One snapshot per selected year, ascending.
    pub snapshots: Vec<YearSnapshot>,
    /// Previous-year comparison for a single year, first-vs-last for a
    /// range.
    pub comparison: Option<ComparisonResult>,
    /// Present for range selections.
    pub trend: Option<TrendSummary>,
}

/// Runtime configuration read from `statline.toml`.
///
/// Paths are resolved relative to the configuration file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatlineConfig {
    /// Region hierarchy CSV.
    pub regions: PathBuf,
    /// Population-dynamics CSV.
    #[serde(default)]
    pub population: Option<PathBuf>,
    /// Violent-crime CSV.
    #[serde(default)]
    pub crime: Option<PathBuf>,
    /// Long-running population series CSV.
    #[serde(default)]
    pub population_history: Option<PathBuf>,
    /// Memoize snapshots per `(region, year)`.
    #[serde(default)]
    pub memoize: bool,
}
