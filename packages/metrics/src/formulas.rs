//! Derived metric formulas.
//!
//! Every formula takes [`MetricValue`] operands, so an `Unavailable` input
//! always yields `Unavailable` and never zero. Formulas that need a
//! structural input the caller may lack (area, a population denominator)
//! return a [`MetricError`] instead.

use statline_metrics_models::{Distribution, MetricValue, Share};
use statline_region_models::RegionCode;

use crate::MetricError;

/// Victims are reported per this many inhabitants.
pub const RATE_SCALE: f64 = 1_000_000.0;

/// `population / area_km2`.
///
/// # Errors
///
/// Returns [`MetricError::MissingArea`] if no area is known.
pub fn density(
    code: &RegionCode,
    population: MetricValue,
    area_km2: Option<f64>,
) -> Result<MetricValue, MetricError> {
    let area = area_km2.ok_or_else(|| MetricError::MissingArea {
        code: code.to_string(),
    })?;
    Ok(population.ratio(MetricValue::Value(area)))
}

/// `births - deaths`.
#[must_use]
pub fn natural_change(births: MetricValue, deaths: MetricValue) -> MetricValue {
    births - deaths
}

/// `immigration - emigration`.
#[must_use]
pub fn migration_balance(immigration: MetricValue, emigration: MetricValue) -> MetricValue {
    immigration - emigration
}

/// `internal_in - internal_out`.
#[must_use]
pub fn internal_migration_net(inbound: MetricValue, outbound: MetricValue) -> MetricValue {
    inbound - outbound
}

/// `natural_change + migration_balance + internal_migration_net`.
#[must_use]
pub fn total_change(
    natural_change: MetricValue,
    migration_balance: MetricValue,
    internal_migration_net: MetricValue,
) -> MetricValue {
    natural_change + migration_balance + internal_migration_net
}

/// `victims / population * 1_000_000`.
///
/// A zero population yields `NotApplicable`.
///
/// # Errors
///
/// Returns [`MetricError::PopulationUnavailable`] if `population` holds no
/// number.
pub fn rate_per_million(
    code: &RegionCode,
    year: i32,
    victims: MetricValue,
    population: MetricValue,
) -> Result<MetricValue, MetricError> {
    if !population.is_value() {
        return Err(MetricError::PopulationUnavailable {
            code: code.to_string(),
            year,
        });
    }
    Ok(victims.ratio(population).map(|r| r * RATE_SCALE))
}

/// Normalizes sub-category counts to percentages of their sum.
///
/// An empty input gives [`Distribution::empty`]; a zero total makes every
/// share `NotApplicable`.
#[must_use]
pub fn distribution(entries: impl IntoIterator<Item = (String, MetricValue)>) -> Distribution {
    let entries: Vec<(String, MetricValue)> = entries.into_iter().collect();
    if entries.is_empty() {
        return Distribution::empty();
    }

    let total = MetricValue::sum(entries.iter().map(|(_, count)| *count));
    let shares = entries
        .into_iter()
        .map(|(label, count)| Share {
            label,
            count,
            percent: count.ratio(total).map(|r| r * 100.0),
        })
        .collect();

    Distribution { total, shares }
}
