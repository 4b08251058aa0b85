//! Figure type for meter readings and money held at two decimal places.
//!
//! This module provides the `Figure` type which wraps `Decimal` and keeps it rounded to two
//! decimal places at all times, so that rounding cannot drift across a chain of calculations.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The number of decimal places every `Figure` is rounded to.
const PLACES: u32 = 2;

/// Represents a unit reading, a usage delta or an amount of money.
///
/// Every constructor rounds to two decimal places, ties away from zero. Arithmetic is checked
/// and re-rounds its result, so every intermediate value obeys the same rule.
///
/// Parsing is limited to what `Decimal` can hold, magnitudes up to about 7.9e28. Larger values
/// fail to parse. Underscore digit separators (`1_000`) are accepted.
///
/// # Examples
///
/// Rounding happens on construction:
/// ```
/// # use bill_splitter::model::Figure;
/// # use std::str::FromStr;
/// let figure = Figure::from_str("10.005").unwrap();
/// assert_eq!(figure.to_string(), "10.01");
/// ```
///
/// Display never carries trailing zeros:
/// ```
/// # use bill_splitter::model::Figure;
/// # use std::str::FromStr;
/// let figure = Figure::from_str("150.00").unwrap();
/// assert_eq!(figure.to_string(), "150");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Figure(Decimal);

impl Figure {
    pub const ZERO: Figure = Figure(Decimal::ZERO);

    /// Creates a new `Figure`, rounding `value` to two decimal places.
    pub fn new(value: Decimal) -> Self {
        Self(round_places(value))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the figure is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the absolute value.
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Returns half of the figure, rounded to two decimal places.
    pub fn half(self) -> Self {
        Self::new(self.0 / Decimal::TWO)
    }

    /// Adds `rhs`, returning `None` on overflow.
    pub fn checked_add(self, rhs: Figure) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self::new)
    }

    /// Subtracts `rhs`, returning `None` on overflow.
    pub fn checked_sub(self, rhs: Figure) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self::new)
    }

    /// Divides by `rhs`, returning `None` when `rhs` is zero or on overflow.
    pub fn checked_div(self, rhs: Figure) -> Option<Self> {
        self.0.checked_div(rhs.0).map(Self::new)
    }

    /// Multiplies by `rhs` and rounds the exact product to a whole number, ties toward positive
    /// infinity. The product is not rounded to two places first.
    pub fn checked_mul_whole(self, rhs: Figure) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(|product| Self(round_whole(product)))
    }
}

/// Two decimal places, ties away from zero.
fn round_places(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole number, ties toward positive infinity (`-2.5` -> `-2`, `2.5` -> `3`).
fn round_whole(value: Decimal) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(0, strategy)
}

/// An error that can occur when parsing strings into `Figure` values.
pub struct FigureError(rust_decimal::Error);

impl Debug for FigureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for FigureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for FigureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Figure {
    type Err = FigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = match Decimal::from_str(trimmed) {
            Ok(value) => value,
            // Scientific notation, e.g. "1.5e3"
            Err(e) if trimmed.contains(['e', 'E']) => {
                Decimal::from_scientific(trimmed).map_err(|_| FigureError(e))?
            }
            Err(e) => return Err(FigureError(e)),
        };
        Ok(Figure::new(value))
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // normalize() strips trailing zeros and turns -0 into 0
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Figure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<Decimal> for Figure {
    fn from(value: Decimal) -> Self {
        Figure::new(value)
    }
}

impl From<Figure> for Decimal {
    fn from(figure: Figure) -> Self {
        figure.value()
    }
}
