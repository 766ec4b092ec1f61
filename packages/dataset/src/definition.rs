//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures everything that differs between source
//! tables: column names, delimiter, coverage window and the agency's
//! missing-cell markers. A single generic loader handles every table.

use serde::Deserialize;
use statline_dataset_models::{DatasetKind, MetricName, YearCoverage};

use crate::LoadError;

/// A complete description of one source table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetDefinition {
    /// Which dataset this describes.
    pub kind: DatasetKind,
    /// Human-readable table title.
    pub name: String,
    /// Agency table identifier, when known.
    #[serde(default)]
    pub table_id: Option<String>,
    /// Single-character field delimiter.
    pub delimiter: String,
    /// First year the table covers.
    pub first_year: i32,
    /// Last year the table covers.
    pub last_year: i32,
    /// Cell contents that mean "value not available".
    pub missing_markers: Vec<String>,
    /// Key and dimension columns.
    pub columns: KeyColumns,
    /// Numeric measure columns.
    pub measures: Vec<MeasureColumn>,
}

/// Columns identifying the observation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyColumns {
    /// Column holding the region code.
    pub region: String,
    /// Column holding the reference year.
    pub year: String,
    /// Column holding the sex label (crime table only).
    #[serde(default)]
    pub sex: Option<String>,
    /// Column holding the characteristic label (crime table only).
    #[serde(default)]
    pub characteristic: Option<String>,
}

/// A numeric column mapped onto a [`MetricName`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureColumn {
    /// Header text in the source file.
    pub column: String,
    /// Metric the column populates.
    pub metric: MetricName,
    /// Whether the column must be present in the header.
    #[serde(default = "default_required")]
    pub required: bool,
}

const fn default_required() -> bool {
    true
}

impl DatasetDefinition {
    /// Inclusive year window.
    #[must_use]
    pub const fn coverage(&self) -> YearCoverage {
        YearCoverage {
            first_year: self.first_year,
            last_year: self.last_year,
        }
    }

    /// Delimiter as the single byte the CSV reader expects.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Definition`] unless the delimiter is exactly
    /// one ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, LoadError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(self.invalid(format!(
                "delimiter must be one ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    /// Whether `cell` (already trimmed) is one of the missing markers.
    #[must_use]
    pub fn is_missing(&self, cell: &str) -> bool {
        self.missing_markers.iter().any(|m| m == cell)
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Definition`] if the window is inverted, no
    /// measures are declared, or the delimiter is invalid.
    pub fn validate(&self) -> Result<(), LoadError> {
        self.delimiter_byte()?;
        if self.first_year > self.last_year {
            return Err(self.invalid(format!(
                "coverage window {}-{} is inverted",
                self.first_year, self.last_year
            )));
        }
        if self.measures.is_empty() {
            return Err(self.invalid("no measure columns declared"));
        }
        if self.columns.sex.is_some() != self.columns.characteristic.is_some() {
            return Err(self.invalid("sex and characteristic columns must be declared together"));
        }
        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> LoadError {
        LoadError::Definition {
            name: self.name.clone(),
            message: message.into(),
        }
    }
}

/// Parses and validates a TOML dataset definition.
///
/// # Errors
///
/// Returns [`LoadError`] if the TOML is malformed or fails validation.
pub fn parse_definition_toml(toml_str: &str) -> Result<DatasetDefinition, LoadError> {
    let definition: DatasetDefinition = toml::from_str(toml_str)?;
    definition.validate()?;
    Ok(definition)
}
