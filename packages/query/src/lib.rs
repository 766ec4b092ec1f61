#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query facade.
//!
//! [`QueryFacade`] is the single entry point for consumers: it validates a
//! region code and year selection, delegates to the metric engine, and
//! assembles a [`StatisticsBundle`] with the region's navigation context.
//! [`QueryFacade::from_config`] bootstraps the hierarchy and every
//! configured dataset from a `statline.toml`.

pub mod config;
pub mod facade;
pub mod trend;

pub use facade::QueryFacade;
pub use statline_query_models::{
    StatisticsBundle, StatlineConfig, TrendSummary, YearSelection, YearValue,
};

use statline_dataset::LoadError;
use statline_dataset_models::YearCoverage;
use statline_metrics::MetricError;
use statline_region::RegionError;
use thiserror::Error;

/// Errors returned by the query facade.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The requested region does not exist.
    #[error("Region not found: {code}")]
    UnknownRegion {
        /// The code that was requested.
        code: String,
    },

    /// A selected year is outside the loaded datasets' coverage.
    #[error("Year {year} is outside the covered years {coverage}")]
    YearOutOfCoverage {
        /// The offending year.
        year: i32,
        /// Union of the loaded datasets' coverage windows.
        coverage: YearCoverage,
    },

    /// No dataset is loaded, so no year can be queried.
    #[error("No datasets loaded")]
    NoData,

    /// A range's start lies after its end.
    #[error("Invalid year range {start}-{end}: start is after end")]
    InvalidRange {
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },

    /// Metric computation failed.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Loading the region hierarchy failed.
    #[error(transparent)]
    Hierarchy(#[from] RegionError),

    /// Loading a dataset failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Reading the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur while reading `statline.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
