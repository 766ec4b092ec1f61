//! Explicit three-state metric values.

use serde::{Deserialize, Serialize};

/// A computed statistic that may be undefined.
///
/// Missing source data and undefined arithmetic are separate states, and
/// neither is ever represented as zero. Serializes as
/// `{"status": "VALUE", "value": n}`, `{"status": "UNAVAILABLE"}` or
/// `{"status": "NOT_APPLICABLE"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricValue {
    /// A computed number.
    Value(f64),
    /// Source data needed for the computation is missing.
    Unavailable,
    /// The computation is undefined for this input (e.g. a zero base).
    NotApplicable,
}

impl MetricValue {
    /// `None` becomes [`MetricValue::Unavailable`].
    #[must_use]
    pub const fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Unavailable,
        }
    }

    /// The number, if there is one.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable | Self::NotApplicable => None,
        }
    }

    /// Whether this is a computed value.
    #[must_use]
    pub const fn is_value(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Whether the value could not be computed.
    #[must_use]
    pub const fn is_unavailable(self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Whether the metric is undefined for its inputs.
    #[must_use]
    pub const fn is_not_applicable(self) -> bool {
        matches!(self, Self::NotApplicable)
    }

    /// Applies `f` to a contained number.
    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::Value(f(v)),
            other => other,
        }
    }

    /// Combines two values.
    ///
    /// `Unavailable` wins over everything, then `NotApplicable`; only two
    /// numbers reach `f`.
    #[must_use]
    pub fn combine(self, other: Self, f: impl FnOnce(f64, f64) -> Self) -> Self {
        match (self, other) {
            (Self::Unavailable, _) | (_, Self::Unavailable) => Self::Unavailable,
            (Self::NotApplicable, _) | (_, Self::NotApplicable) => Self::NotApplicable,
            (Self::Value(a), Self::Value(b)) => f(a, b),
        }
    }

    /// Division where a zero denominator is [`MetricValue::NotApplicable`].
    #[must_use]
    pub fn ratio(self, denominator: Self) -> Self {
        self.combine(denominator, |n, d| {
            if d == 0.0 {
                Self::NotApplicable
            } else {
                Self::Value(n / d)
            }
        })
    }

    /// Sums a sequence; any `Unavailable` item makes the sum unavailable.
    #[must_use]
    pub fn sum(values: impl IntoIterator<Item = Self>) -> Self {
        values
            .into_iter()
            .fold(Self::Value(0.0), |acc, v| acc.combine(v, |a, b| Self::Value(a + b)))
    }
}

impl std::ops::Add for MetricValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| Self::Value(a + b))
    }
}

impl std::ops::Sub for MetricValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| Self::Value(a - b))
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Unavailable => f.write_str("n/a"),
            Self::NotApplicable => f.write_str("-"),
        }
    }
}
