#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region hierarchy.
//!
//! Loads the static region-to-parent mapping shipped with the dataset into
//! an arena of [`Region`] nodes addressed by code, and answers the
//! structural questions the metric engine and query facade need: ancestry
//! chains for breadcrumbs, descendant sets for aggregation, and
//! case-insensitive name search.

pub mod hierarchy;
pub mod loader;
pub mod search;

pub use hierarchy::RegionHierarchy;
pub use search::SearchIndex;
pub use statline_region_models::{Region, RegionCode, RegionLevel, RegionSummary};

use thiserror::Error;

/// Errors that can occur while building or querying the hierarchy.
#[derive(Debug, Error)]
pub enum RegionError {
    /// The requested code does not exist in the hierarchy.
    #[error("Region not found: {code}")]
    UnknownRegion {
        /// The code that was looked up.
        code: String,
    },

    /// The static mapping violates a structural invariant.
    #[error("Invalid region hierarchy at row {row}: {message}")]
    InvalidHierarchy {
        /// 1-based data row of the offending entry (0 for whole-file checks).
        row: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegionError {
    pub(crate) fn invalid(row: usize, message: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            row,
            message: message.into(),
        }
    }
}
