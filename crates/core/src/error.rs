//! Pricing Errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Percentage outside `0..=100`.
    #[error("percentage {0} is outside the range 0 to 100")]
    InvalidPercentage(Decimal),

    /// Percentage that cannot be reversed by inversion (100% on a selling price base).
    #[error("a 100% discount on the selling price cannot be reversed")]
    InvalidDiscountValue,

    /// Entity already carries an admin level discount.
    #[error("entity already carries an admin discount")]
    AlreadyDiscounted,

    /// Entity does not carry the admin discount being removed.
    #[error("discount is not applied to this entity")]
    NotApplied,

    /// Applying the discount would produce a negative price.
    #[error("discount would produce a negative price ({0})")]
    NegativePrice(Decimal),

    /// Entity is inactive, blocked or deleted.
    #[error("entity is not available for pricing changes")]
    Unavailable,

    /// Sale has ended and no longer accepts membership changes.
    #[error("sale has already ended")]
    SaleEnded,

    /// Window start is not before its end.
    #[error("start date must be before end date")]
    InvalidWindow,

    /// Decimal arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// Errors that can name their failure category for callers.
pub trait ErrorKind {
    /// Stable snake_case identifier for this error.
    fn kind(&self) -> &'static str;
}

impl ErrorKind for PricingError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPercentage(_) | Self::Unavailable | Self::InvalidWindow => {
                "validation_failed"
            }
            Self::InvalidDiscountValue => "invalid_discount_value",
            Self::AlreadyDiscounted => "already_discounted",
            Self::NotApplied => "not_applied",
            Self::NegativePrice(_) => "negative_price",
            Self::SaleEnded => "sale_ended",
            Self::Overflow => "overflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_snake_case_names() {
        assert_eq!(PricingError::AlreadyDiscounted.kind(), "already_discounted");
        assert_eq!(PricingError::NotApplied.kind(), "not_applied");
        assert_eq!(PricingError::SaleEnded.kind(), "sale_ended");
        assert_eq!(
            PricingError::InvalidPercentage(Decimal::ONE_HUNDRED).kind(),
            "validation_failed"
        );
    }
}
