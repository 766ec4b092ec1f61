//! Loads the static region mapping from CSV.
//!
//! Expected columns: `Code`, `Name`, `Level`, `Parent`, `Area (km2)`.
//! `Parent` is empty for the National root and `Area (km2)` may be empty
//! when no land area is published for a region.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use statline_region_models::{RegionCode, RegionLevel};

use crate::RegionError;
use crate::hierarchy::{RegionEntry, RegionHierarchy};

const REQUIRED_COLUMNS: &[&str] = &["Code", "Name", "Level", "Parent", "Area (km2)"];

#[derive(Debug, Deserialize)]
struct RegionRow {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Level")]
    level: String,
    #[serde(rename = "Parent")]
    parent: String,
    #[serde(rename = "Area (km2)")]
    area_km2: String,
}

/// Loads a hierarchy from a CSV file on disk.
///
/// # Errors
///
/// Returns [`RegionError`] if the file cannot be read or the mapping is
/// invalid.
pub fn load_hierarchy_from_path(path: &Path) -> Result<RegionHierarchy, RegionError> {
    log::info!("Loading region hierarchy from {}", path.display());
    let file = std::fs::File::open(path)?;
    let hierarchy = load_hierarchy(file)?;
    log::info!("Loaded {} regions", hierarchy.len());
    Ok(hierarchy)
}

/// Loads a hierarchy from any CSV reader.
///
/// # Errors
///
/// Returns [`RegionError`] if a column is missing, a row is malformed, or
/// the resulting tree violates a structural invariant.
pub fn load_hierarchy(reader: impl Read) -> Result<RegionHierarchy, RegionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers
            .iter()
            .any(|h| h.trim_start_matches('\u{feff}') == *column)
        {
            return Err(RegionError::invalid(
                0,
                format!("missing column '{column}'"),
            ));
        }
    }
    // Tolerate a UTF-8 byte-order mark on the first header.
    let cleaned: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();
    rdr.set_headers(cleaned);

    let mut entries = Vec::new();
    for (idx, result) in rdr.deserialize::<RegionRow>().enumerate() {
        let row = idx + 1;
        let raw = result?;
        entries.push(parse_row(row, raw)?);
    }

    RegionHierarchy::build(entries)
}

fn parse_row(row: usize, raw: RegionRow) -> Result<RegionEntry, RegionError> {
    let code =
        RegionCode::parse(&raw.code).map_err(|e| RegionError::invalid(row, e.to_string()))?;

    if raw.name.is_empty() {
        return Err(RegionError::invalid(row, format!("region {code} has no name")));
    }

    let level = raw
        .level
        .parse::<RegionLevel>()
        .map_err(|_| RegionError::invalid(row, format!("unknown level '{}'", raw.level)))?;

    let parent = if raw.parent.is_empty() {
        None
    } else {
        Some(
            RegionCode::parse(&raw.parent)
                .map_err(|e| RegionError::invalid(row, format!("parent: {e}")))?,
        )
    };

    let area_km2 = if raw.area_km2.is_empty() {
        None
    } else {
        let area = raw.area_km2.parse::<f64>().map_err(|_| {
            RegionError::invalid(row, format!("invalid area '{}'", raw.area_km2))
        })?;
        if !area.is_finite() || area <= 0.0 {
            return Err(RegionError::invalid(
                row,
                format!("area must be positive, got {area}"),
            ));
        }
        Some(area)
    };

    Ok(RegionEntry {
        code,
        name: raw.name,
        level,
        parent,
        area_km2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture() {
        let h = load_hierarchy(include_str!("../../../test-data/regions.csv").as_bytes()).unwrap();
        assert_eq!(h.len(), 16);
        assert_eq!(h.root().name, "Nederland");
        assert_eq!(h.resolve("CR23").unwrap().level, RegionLevel::Corop);
    }

    #[test]
    fn tolerates_byte_order_mark() {
        let csv = "\u{feff}Code,Name,Level,Parent,Area (km2)\nNL01,Nederland,National,,\n";
        let h = load_hierarchy(csv.as_bytes()).unwrap();
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn reports_missing_column_as_header_row() {
        let csv = "Code,Name,Level,Parent\nNL01,Nederland,National,\n";
        let err = load_hierarchy(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, RegionError::InvalidHierarchy { row: 0, .. }));
        assert!(err.to_string().contains("Area (km2)"));
    }

    #[test]
    fn reports_bad_level_and_area_with_row() {
        let csv = "Code,Name,Level,Parent,Area (km2)\n\
                   NL01,Nederland,National,,\n\
                   LD01,Noord,Region,NL01,\n";
        let err = load_hierarchy(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, RegionError::InvalidHierarchy { row: 2, .. }));

        let csv = "Code,Name,Level,Parent,Area (km2)\n\
                   NL01,Nederland,National,,abc\n";
        let err = load_hierarchy(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, RegionError::InvalidHierarchy { row: 1, .. }));
    }
}
