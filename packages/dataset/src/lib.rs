#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source tables: definitions, validation, and in-memory storage.
//!
//! Each table the system ingests is described by an embedded TOML
//! [`definition::DatasetDefinition`]. The [`loader::SchemaLoader`] reads a
//! CSV file against that definition and the region hierarchy, rejecting
//! anything malformed with a [`LoadError::SchemaViolation`]. Accepted rows
//! are indexed into a [`store::RecordStore`] partitioned by region and
//! year.

pub mod definition;
pub mod labels;
pub mod loader;
pub mod progress;
pub mod registry;
pub mod store;

pub use loader::SchemaLoader;
pub use statline_dataset_models::{
    Breakdown, Characteristic, DatasetKind, MetricName, RawRecord, Sex, YearCoverage,
};
pub use store::RecordStore;

/// Errors that can occur while loading a dataset.
///
/// All of these are fatal at startup: a dashboard built on partially
/// invalid input would be silently wrong.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A row or header does not match the dataset definition.
    #[error("Schema violation in {dataset} at row {row}, column '{column}': {message}")]
    SchemaViolation {
        /// Dataset being loaded.
        dataset: DatasetKind,
        /// 1-based data row; 0 refers to the header row.
        row: usize,
        /// Offending column name.
        column: String,
        /// Description of what went wrong.
        message: String,
    },

    /// An embedded dataset definition is invalid.
    #[error("Invalid dataset definition '{name}': {message}")]
    Definition {
        /// Definition name.
        name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn violation(
        dataset: DatasetKind,
        row: usize,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaViolation {
            dataset,
            row,
            column: column.to_string(),
            message: message.into(),
        }
    }
}
