//! Price State
//!
//! The per-entity view the engine works on: list price, current selling price, the
//! seller's own discount and at most one admin level layer on top.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::PricingError, percent::Percent};

/// The price an admin level percentage is applied against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceBase {
    /// Apply against the list price, discarding the seller discount.
    #[serde(rename = "MRP")]
    Mrp,

    /// Apply against the current selling price, layering on the seller discount.
    #[serde(rename = "sellingPrice")]
    SellingPrice,

    /// Apply against the summed selling prices of a bundle's members.
    #[serde(rename = "members")]
    Members,
}

impl PriceBase {
    /// Storage and wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mrp => "MRP",
            Self::SellingPrice => "sellingPrice",
            Self::Members => "members",
        }
    }

    /// Parse a stored base, which unlike the wire form may name the members base.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPriceBase`] for an unrecognised name.
    pub fn from_storage(value: &str) -> Result<Self, UnknownPriceBase> {
        match value {
            "members" => Ok(Self::Members),
            other => other.parse(),
        }
    }
}

impl FromStr for PriceBase {
    type Err = UnknownPriceBase;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MRP" => Ok(Self::Mrp),
            "sellingPrice" => Ok(Self::SellingPrice),
            other => Err(UnknownPriceBase(other.to_owned())),
        }
    }
}

impl fmt::Display for PriceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised price base name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown price base: {0}")]
pub struct UnknownPriceBase(pub String);

/// Where an admin level layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerSource {
    /// A standalone discount.
    Discount(Uuid),

    /// A time-boxed sale.
    Sale(Uuid),
}

impl LayerSource {
    /// Storage name of the source kind.
    #[must_use]
    pub const fn kind_str(self) -> &'static str {
        match self {
            Self::Discount(_) => "discount",
            Self::Sale(_) => "sale",
        }
    }

    /// Identifier of the source entity.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Discount(uuid) | Self::Sale(uuid) => uuid,
        }
    }
}

/// Rounding applied to a layered price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Keep full decimal precision.
    Exact,

    /// Round to the nearest whole unit, midpoint away from zero.
    WholeUnit,
}

/// A single admin level discount layered on top of seller pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminLayer {
    /// The discount or sale that owns the layer.
    pub source: LayerSource,
    /// Percentage taken off the base.
    pub percent: Percent,
    /// Price the percentage is taken from.
    pub base: PriceBase,
    /// Rounding applied to the layered price.
    pub rounding: Rounding,
}

impl AdminLayer {
    /// Layer created by a standalone discount.
    #[must_use]
    pub const fn discount(uuid: Uuid, percent: Percent, base: PriceBase) -> Self {
        Self {
            source: LayerSource::Discount(uuid),
            percent,
            base,
            rounding: Rounding::Exact,
        }
    }

    /// Layer created by a sale category; always selling-price based and rounded.
    #[must_use]
    pub const fn sale(uuid: Uuid, percent: Percent) -> Self {
        Self {
            source: LayerSource::Sale(uuid),
            percent,
            base: PriceBase::SellingPrice,
            rounding: Rounding::WholeUnit,
        }
    }

    /// Sale layer on a bundle, priced from its members rather than its own price.
    #[must_use]
    pub const fn bundle_sale(uuid: Uuid, percent: Percent) -> Self {
        Self {
            source: LayerSource::Sale(uuid),
            percent,
            base: PriceBase::Members,
            rounding: Rounding::WholeUnit,
        }
    }

    /// Ensure the layer can later be reversed by inversion.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidDiscountValue`] for a 100% selling-price layer.
    pub fn ensure_reversible(&self) -> Result<(), PricingError> {
        ensure_reversible(self.percent, self.base)
    }
}

/// Ensure a percentage on the given base can be reversed by inversion.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDiscountValue`] for a 100% selling-price percentage.
pub fn ensure_reversible(percent: Percent, base: PriceBase) -> Result<(), PricingError> {
    if base == PriceBase::SellingPrice && percent.is_full() {
        return Err(PricingError::InvalidDiscountValue);
    }

    Ok(())
}

/// Lifecycle flags that gate pricing changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    /// Listed for sale by its seller.
    pub is_active: bool,
    /// Taken down by an admin.
    pub is_blocked: bool,
    /// Soft-deleted.
    pub is_deleted: bool,
}

impl Availability {
    /// Active, unblocked and not deleted.
    #[must_use]
    pub const fn available() -> Self {
        Self {
            is_active: true,
            is_blocked: false,
            is_deleted: false,
        }
    }

    /// Whether new discounts may be applied.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && !self.is_blocked && !self.is_deleted
    }
}

/// Pricing state of a product or bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceState {
    /// List price.
    pub mrp: Decimal,
    /// Price currently charged, including any admin layer.
    pub selling_price: Decimal,
    /// The seller's own discount off the list price.
    pub base_discount: Percent,
    /// Admin level layer, at most one.
    pub layer: Option<AdminLayer>,
    /// Lifecycle flags gating new layers.
    pub availability: Availability,
}

impl PriceState {
    /// Whether the state carries a layer from `source`.
    #[must_use]
    pub fn is_layered_by(&self, source: LayerSource) -> bool {
        self.layer.is_some_and(|layer| layer.source == source)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn price_base_parses_wire_names() -> TestResult {
        assert_eq!("MRP".parse::<PriceBase>()?, PriceBase::Mrp);
        assert_eq!("sellingPrice".parse::<PriceBase>()?, PriceBase::SellingPrice);
        assert!("selling_price".parse::<PriceBase>().is_err());
        assert!("members".parse::<PriceBase>().is_err());
        assert_eq!(PriceBase::from_storage("members")?, PriceBase::Members);
        assert_eq!(PriceBase::from_storage("MRP")?, PriceBase::Mrp);

        Ok(())
    }

    #[test]
    fn full_selling_price_layer_is_not_reversible() -> TestResult {
        let layer = AdminLayer::discount(Uuid::nil(), Percent::FULL, PriceBase::SellingPrice);

        assert_eq!(
            layer.ensure_reversible(),
            Err(PricingError::InvalidDiscountValue)
        );

        let layer = AdminLayer::discount(Uuid::nil(), Percent::FULL, PriceBase::Mrp);

        assert_eq!(layer.ensure_reversible(), Ok(()));

        let layer = AdminLayer::sale(Uuid::nil(), Percent::whole(99)?);

        assert_eq!(layer.ensure_reversible(), Ok(()));

        Ok(())
    }

    #[test]
    fn blocked_entities_are_unavailable() {
        let availability = Availability {
            is_blocked: true,
            ..Availability::available()
        };

        assert!(!availability.is_available());
        assert!(Availability::available().is_available());
    }
}
