//! Range classification for optional `(from, to)` bounds
//!
//! Every range-shaped criterion (product counts, prices, ratings, margin
//! rates, timestamps) goes through [`RangeFilter::classify`] so that all of
//! them share the same four evaluation modes.

use serde::Serialize;

/// Evaluation mode of a range criterion, without its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Neither bound supplied: the criterion is inactive
    None,
    /// Only the lower bound: `value >= from`
    FromOnly,
    /// Only the upper bound: `value <= to`
    ToOnly,
    /// Both bounds: `from <= value <= to`
    Both,
}

/// A classified range together with its bounds
///
/// Bounds are applied literally. A `Both(from, to)` range with `from > to`
/// is kept as-is and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RangeFilter<T> {
    #[default]
    None,
    FromOnly(T),
    ToOnly(T),
    Both(T, T),
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    /// Classify an optional pair of bounds
    pub fn classify(from: Option<T>, to: Option<T>) -> Self {
        match (from, to) {
            (None, None) => RangeFilter::None,
            (Some(from), None) => RangeFilter::FromOnly(from),
            (None, Some(to)) => RangeFilter::ToOnly(to),
            (Some(from), Some(to)) => RangeFilter::Both(from, to),
        }
    }

    pub fn mode(&self) -> RangeMode {
        match self {
            RangeFilter::None => RangeMode::None,
            RangeFilter::FromOnly(_) => RangeMode::FromOnly,
            RangeFilter::ToOnly(_) => RangeMode::ToOnly,
            RangeFilter::Both(_, _) => RangeMode::Both,
        }
    }

    /// Whether the range constrains anything at all
    pub fn is_active(&self) -> bool {
        !matches!(self, RangeFilter::None)
    }

    /// Lower bound, if any
    pub fn lower(&self) -> Option<T> {
        match self {
            RangeFilter::FromOnly(from) | RangeFilter::Both(from, _) => Some(*from),
            _ => None,
        }
    }

    /// Upper bound, if any
    pub fn upper(&self) -> Option<T> {
        match self {
            RangeFilter::ToOnly(to) | RangeFilter::Both(_, to) => Some(*to),
            _ => None,
        }
    }

    /// Check a value against the range
    ///
    /// An inactive range accepts every value.
    pub fn contains(&self, value: &T) -> bool {
        match self {
            RangeFilter::None => true,
            RangeFilter::FromOnly(from) => value >= from,
            RangeFilter::ToOnly(to) => value <= to,
            RangeFilter::Both(from, to) => value >= from && value <= to,
        }
    }

    /// Map the bounds to another type, keeping the mode
    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> RangeFilter<U> {
        match self {
            RangeFilter::None => RangeFilter::None,
            RangeFilter::FromOnly(from) => RangeFilter::FromOnly(f(from)),
            RangeFilter::ToOnly(to) => RangeFilter::ToOnly(f(to)),
            RangeFilter::Both(from, to) => RangeFilter::Both(f(from), f(to)),
        }
    }
}
