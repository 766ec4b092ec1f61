#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived-metric engine.
//!
//! Turns raw per-region, per-year records into [`YearSnapshot`]s: raw
//! counts are taken from the region's own rows or summed from the first
//! complete lower level of the hierarchy, and ratios (density, rate per
//! million, distribution shares) are always recomputed from summed
//! numerators and denominators rather than averaged.

pub mod aggregate;
pub mod cache;
pub mod engine;
pub mod formulas;

#[cfg(test)]
mod test_fixtures;

pub use cache::SnapshotCache;
pub use engine::MetricEngine;
pub use statline_metrics_models::{
    ComparisonResult, CrimeFigures, Distribution, MetricDelta, MetricValue, PopulationFigures,
    Share, SnapshotMetric, SnapshotNote, UnavailableReason, YearSnapshot,
};

use statline_region::RegionError;
use thiserror::Error;

/// Errors raised by the metric engine.
///
/// `MissingArea` and `PopulationUnavailable` are scoped to a single
/// formula; the engine turns them into an `Unavailable` metric plus a
/// [`SnapshotNote`] instead of failing the snapshot.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Region lookup failed.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// Density requested for a region with no known land area.
    #[error("No land area known for region {code}")]
    MissingArea {
        /// Region code.
        code: String,
    },

    /// Rate requested without a matching population figure.
    #[error("No population available for region {code} in {year}")]
    PopulationUnavailable {
        /// Region code.
        code: String,
        /// Year.
        year: i32,
    },

    /// A comparison was requested across two different regions.
    #[error("Cannot compare snapshots of {a} and {b}")]
    RegionMismatch {
        /// Region of the first snapshot.
        a: String,
        /// Region of the second snapshot.
        b: String,
    },
}

impl MetricError {
    /// The note reason this error maps to when scoped to one metric.
    #[must_use]
    pub const fn reason(&self) -> UnavailableReason {
        match self {
            Self::MissingArea { .. } => UnavailableReason::MissingArea,
            Self::PopulationUnavailable { .. } => UnavailableReason::PopulationUnavailable,
            Self::Region(_) | Self::RegionMismatch { .. } => UnavailableReason::MissingInput,
        }
    }
}
