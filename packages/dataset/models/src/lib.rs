#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed source records.
//!
//! Every published table cell becomes one [`RawRecord`]: a single observed
//! value for a (region, year, metric, breakdown) key. Suppressed or
//! unavailable cells keep `value: None` so they can never be mistaken for
//! zero downstream.

use serde::{Deserialize, Serialize};
use statline_region_models::RegionCode;
use strum_macros::{AsRefStr, Display, EnumString};

/// The source tables the system knows how to load.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Population dynamics per region and year.
    PopulationDynamics,
    /// Murder and manslaughter victims.
    ViolentCrime,
    /// Long-running population series used as a fallback denominator.
    PopulationHistory,
}

impl DatasetKind {
    /// Whether the dataset only backs other figures and does not extend
    /// the range of queryable years.
    #[must_use]
    pub const fn is_fallback_series(self) -> bool {
        matches!(self, Self::PopulationHistory)
    }
}

/// Name of a published measure.
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
pub enum MetricName {
    /// Population at the start of the period.
    Population,
    /// Live births.
    Births,
    /// Deaths.
    Deaths,
    /// Settlement from abroad (including administrative corrections).
    Immigration,
    /// Departure abroad (including administrative corrections).
    Emigration,
    /// Settlement from another municipality.
    InternalMigrationIn,
    /// Departure to another municipality.
    InternalMigrationOut,
    /// Murder and manslaughter victims.
    Victims,
    /// Victims per million inhabitants as published by the agency.
    PublishedVictimRate,
}

impl MetricName {
    /// Whether values of this metric can be summed across regions.
    ///
    /// Published ratios are never additive; they must be recomputed from
    /// summed numerators and denominators.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        !matches!(self, Self::PublishedVictimRate)
    }
}

/// Sex dimension of the crime table.
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
pub enum Sex {
    /// Total male and female.
    Total,
    /// Men.
    Male,
    /// Women.
    Female,
}

/// Characteristic dimension of the crime table.
///
/// The published table packs method, age group and location into one
/// column with a `"Method: "`, `"Age: "` or `"Location: "` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Characteristic {
    /// All characteristics combined.
    Total,
    /// Method of killing (e.g. "Stabbing").
    Method(String),
    /// Victim age group (e.g. "20 to 30 years").
    AgeGroup(String),
    /// Location of the crime (e.g. "Home").
    Location(String),
}

impl Characteristic {
    /// The sub-category label, or `None` for [`Characteristic::Total`].
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Total => None,
            Self::Method(l) | Self::AgeGroup(l) | Self::Location(l) => Some(l),
        }
    }
}

/// Breakdown of a record along the crime table's dimensions.
///
/// Population rows always use [`Breakdown::TOTAL`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Sex dimension.
    pub sex: Sex,
    /// Characteristic dimension.
    pub characteristic: Characteristic,
}

impl Breakdown {
    /// The all-totals breakdown.
    pub const TOTAL: Self = Self {
        sex: Sex::Total,
        characteristic: Characteristic::Total,
    };

    /// Breakdown by sex only.
    #[must_use]
    pub const fn sex(sex: Sex) -> Self {
        Self {
            sex,
            characteristic: Characteristic::Total,
        }
    }

    /// Breakdown by characteristic for both sexes combined.
    #[must_use]
    pub const fn characteristic(characteristic: Characteristic) -> Self {
        Self {
            sex: Sex::Total,
            characteristic,
        }
    }
}

impl Default for Breakdown {
    fn default() -> Self {
        Self::TOTAL
    }
}

/// One observed fact. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Region the value was published for.
    pub region_code: RegionCode,
    /// Reference year.
    pub year: i32,
    /// Which measure this is.
    pub metric: MetricName,
    /// Sex/characteristic breakdown.
    pub breakdown: Breakdown,
    /// Published value; `None` for a suppressed or unavailable cell.
    pub value: Option<f64>,
}

/// Inclusive range of years a dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCoverage {
    /// First covered year.
    pub first_year: i32,
    /// Last covered year.
    pub last_year: i32,
}

impl YearCoverage {
    /// Whether `year` lies inside the window.
    #[must_use]
    pub const fn contains(self, year: i32) -> bool {
        year >= self.first_year && year <= self.last_year
    }

    /// Smallest window covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            first_year: self.first_year.min(other.first_year),
            last_year: self.last_year.max(other.last_year),
        }
    }
}

impl std::fmt::Display for YearCoverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first_year, self.last_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_contains_is_inclusive() {
        let cov = YearCoverage {
            first_year: 2012,
            last_year: 2023,
        };
        assert!(cov.contains(2012));
        assert!(cov.contains(2023));
        assert!(!cov.contains(2011));
        assert!(!cov.contains(2024));
    }

    #[test]
    fn coverage_union_spans_both() {
        let pop = YearCoverage {
            first_year: 2012,
            last_year: 2023,
        };
        let crime = YearCoverage {
            first_year: 1996,
            last_year: 2023,
        };
        assert_eq!(
            pop.union(crime),
            YearCoverage {
                first_year: 1996,
                last_year: 2023
            }
        );
    }

    #[test]
    fn published_rate_is_not_additive() {
        assert!(MetricName::Population.is_additive());
        assert!(MetricName::Victims.is_additive());
        assert!(!MetricName::PublishedVictimRate.is_additive());
    }

    #[test]
    fn metric_names_round_trip_through_strings() {
        assert_eq!(MetricName::InternalMigrationIn.to_string(), "INTERNAL_MIGRATION_IN");
        assert_eq!(
            "PUBLISHED_VICTIM_RATE".parse::<MetricName>().unwrap(),
            MetricName::PublishedVictimRate
        );
    }
}
