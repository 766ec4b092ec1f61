#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region types.
//!
//! The Dutch statistical geography is a fixed five-level tree:
//! National → Landsdeel → Province → COROP region → Municipality. Every
//! region code carries a two-letter prefix identifying its level
//! (`NL01`, `LD03`, `PV27`, `CR23`, `GM0363`).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Level of a region in the administrative hierarchy.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RegionLevel {
    /// The whole country (single root).
    National,
    /// Grouping of provinces.
    Landsdeel,
    /// One of the twelve provinces.
    Province,
    /// Statistical sub-provincial region.
    #[strum(serialize = "COROP")]
    #[serde(rename = "COROP")]
    Corop,
    /// Municipality (gemeente), the finest published granularity.
    Municipality,
}

impl RegionLevel {
    /// Distance from the National root (National = 0, Municipality = 4).
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::National => 0,
            Self::Landsdeel => 1,
            Self::Province => 2,
            Self::Corop => 3,
            Self::Municipality => 4,
        }
    }

    /// The level one step closer to the root, or `None` for National.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::National => None,
            Self::Landsdeel => Some(Self::National),
            Self::Province => Some(Self::Landsdeel),
            Self::Corop => Some(Self::Province),
            Self::Municipality => Some(Self::Corop),
        }
    }

    /// The level one step further from the root, or `None` for
    /// Municipality.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::National => Some(Self::Landsdeel),
            Self::Landsdeel => Some(Self::Province),
            Self::Province => Some(Self::Corop),
            Self::Corop => Some(Self::Municipality),
            Self::Municipality => None,
        }
    }

    /// Two-letter code prefix used by the statistics agency.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::National => "NL",
            Self::Landsdeel => "LD",
            Self::Province => "PV",
            Self::Corop => "CR",
            Self::Municipality => "GM",
        }
    }

    /// Looks up the level for a two-letter code prefix.
    #[must_use]
    pub fn from_code_prefix(prefix: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.code_prefix().eq_ignore_ascii_case(prefix))
    }

    /// Returns all levels ordered from the root downwards.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::National,
            Self::Landsdeel,
            Self::Province,
            Self::Corop,
            Self::Municipality,
        ]
    }
}

/// A validated, level-tagged region code such as `GM0363`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Parses and normalizes a region code.
    ///
    /// Codes are trimmed and upper-cased. A well-formed code is a known
    /// two-letter level prefix followed by two to four ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRegionCodeError`] if the code is malformed.
    pub fn parse(raw: &str) -> Result<Self, InvalidRegionCodeError> {
        let code = raw.trim().to_ascii_uppercase();
        let invalid = || InvalidRegionCodeError {
            code: raw.to_string(),
        };

        if !code.is_ascii() || code.len() < 4 || code.len() > 6 {
            return Err(invalid());
        }
        let (prefix, digits) = code.split_at(2);
        if RegionLevel::from_code_prefix(prefix).is_none()
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        Ok(Self(code))
    }

    /// The level encoded in the code prefix.
    #[must_use]
    pub fn level(&self) -> RegionLevel {
        // The prefix was validated in `parse`.
        RegionLevel::from_code_prefix(&self.0[..2]).unwrap_or(RegionLevel::Municipality)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = InvalidRegionCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

/// Error returned when a string is not a well-formed region code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRegionCodeError {
    /// The rejected input.
    pub code: String,
}

impl std::fmt::Display for InvalidRegionCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid region code '{}': expected NL/LD/PV/CR/GM followed by digits",
            self.code
        )
    }
}

impl std::error::Error for InvalidRegionCodeError {}

/// A node of the administrative hierarchy.
///
/// The parent is a non-owning reference by code; the hierarchy arena owns
/// the top-down child lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Unique, level-tagged code.
    pub code: RegionCode,
    /// Official name (e.g. "Amsterdam", "Groot-Amsterdam").
    pub name: String,
    /// Hierarchy level.
    pub level: RegionLevel,
    /// Code of the parent region; `None` only for the National root.
    pub parent: Option<RegionCode>,
    /// Codes of direct children, sorted.
    pub children: Vec<RegionCode>,
    /// Land area in square kilometres, when published for this region.
    pub area_km2: Option<f64>,
}

/// Lightweight reference to a region for breadcrumbs and navigation lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    /// Region code.
    pub code: RegionCode,
    /// Region name.
    pub name: String,
    /// Hierarchy level.
    pub level: RegionLevel,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            code: region.code.clone(),
            name: region.name.clone(),
            level: region.level,
        }
    }
}
