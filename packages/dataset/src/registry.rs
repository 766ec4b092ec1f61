//! Dataset registry — loads all table definitions from embedded TOML.
//!
//! Each `.toml` file in `packages/dataset/datasets/` is baked into the
//! binary at compile time via [`include_str!`], so column sets, delimiters
//! and coverage windows are constants rather than runtime configuration.

use statline_dataset_models::DatasetKind;

use crate::definition::{DatasetDefinition, parse_definition_toml};

/// TOML definitions embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    (
        "population_dynamics",
        include_str!("../datasets/population_dynamics.toml"),
    ),
    ("violent_crime", include_str!("../datasets/violent_crime.toml")),
    (
        "population_history",
        include_str!("../datasets/population_history.toml"),
    ),
];

/// Returns every embedded dataset definition.
///
/// # Panics
///
/// Panics if an embedded TOML file is malformed; the files are compiled
/// in, so this is caught by the registry tests.
#[must_use]
pub fn all_definitions() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_definition_toml(toml)
                .unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition for one dataset.
///
/// # Panics
///
/// Panics if the embedded definition for `kind` is missing or malformed.
#[must_use]
pub fn definition(kind: DatasetKind) -> DatasetDefinition {
    all_definitions()
        .into_iter()
        .find(|d| d.kind == kind)
        .unwrap_or_else(|| panic!("No embedded definition for dataset {kind}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_definitions() {
        let defs = all_definitions();
        assert_eq!(defs.len(), DATASET_TOMLS.len());
    }

    #[test]
    fn every_kind_has_exactly_one_definition() {
        let defs = all_definitions();
        for kind in [
            DatasetKind::PopulationDynamics,
            DatasetKind::ViolentCrime,
            DatasetKind::PopulationHistory,
        ] {
            assert_eq!(defs.iter().filter(|d| d.kind == kind).count(), 1, "{kind}");
        }
    }

    #[test]
    fn coverage_windows_match_published_tables() {
        let pop = definition(DatasetKind::PopulationDynamics).coverage();
        assert_eq!((pop.first_year, pop.last_year), (2012, 2023));
        let crime = definition(DatasetKind::ViolentCrime).coverage();
        assert_eq!((crime.first_year, crime.last_year), (1996, 2023));
    }

    #[test]
    fn crime_table_declares_breakdown_columns() {
        let crime = definition(DatasetKind::ViolentCrime);
        assert!(crime.columns.sex.is_some());
        assert!(crime.columns.characteristic.is_some());
        assert!(crime.measures.iter().any(|m| !m.required));
    }
}
