//! Percentages

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// A discount percentage in the range `0..=100`, expressed in whole-number style
/// (`20` means 20%).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    /// No discount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// A full discount.
    pub const FULL: Self = Self(Decimal::ONE_HUNDRED);

    /// Validate and wrap a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidPercentage`] when `value` is negative or above 100.
    pub fn new(value: Decimal) -> Result<Self, PricingError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PricingError::InvalidPercentage(value));
        }

        Ok(Self(value.normalize()))
    }

    /// Build a percentage from a whole number of percent.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidPercentage`] when `value` is above 100.
    pub fn whole(value: u8) -> Result<Self, PricingError> {
        Self::new(Decimal::from(value))
    }

    /// The raw percentage value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Whether this is a 100% discount.
    #[must_use]
    pub fn is_full(self) -> bool {
        self.0 == Decimal::ONE_HUNDRED
    }

    /// Whether this is a 0% discount.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Portion of the price that remains after the discount, `1 - p/100`.
    #[must_use]
    pub fn remaining(self) -> Decimal {
        Decimal::ONE - self.0 / Decimal::ONE_HUNDRED
    }

    /// Portion of the price that is taken off, `p/100`.
    #[must_use]
    pub fn fraction(self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = PricingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
