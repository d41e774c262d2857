//! Discount Engine
//!
//! Applies a single admin level layer to a [`PriceState`] and reverses it again. A
//! layer against the list price is undone by recomputing the seller price from
//! scratch; a layer against the selling price is undone by inverting the
//! multiplicative discount. A bundle sale layer is priced from the bundle's
//! members (see [`crate::bundle::apply_sale`]) and undone like a list price layer.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    error::PricingError,
    percent::Percent,
    state::{AdminLayer, LayerSource, PriceBase, PriceState, Rounding},
};

/// `price - price × p/100`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the multiplication overflows.
pub fn discount_price(price: Decimal, percent: Percent) -> Result<Decimal, PricingError> {
    let reduction = price
        .checked_mul(percent.fraction())
        .ok_or(PricingError::Overflow)?;

    price
        .checked_sub(reduction)
        .map(|price| price.normalize())
        .ok_or(PricingError::Overflow)
}

/// Selling price implied by the list price and the seller's own discount.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the arithmetic overflows.
pub fn base_selling_price(mrp: Decimal, base_discount: Percent) -> Result<Decimal, PricingError> {
    discount_price(mrp, base_discount)
}

/// Invert [`discount_price`], `price / (1 - p/100)`.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDiscountValue`] for a 100% percentage and
/// [`PricingError::Overflow`] when the division overflows.
pub fn restore_price(price: Decimal, percent: Percent) -> Result<Decimal, PricingError> {
    if percent.is_full() {
        return Err(PricingError::InvalidDiscountValue);
    }

    price
        .checked_div(percent.remaining())
        .map(|price| price.normalize())
        .ok_or(PricingError::Overflow)
}

pub(crate) fn round(price: Decimal, rounding: Rounding) -> Decimal {
    match rounding {
        Rounding::Exact => price,
        Rounding::WholeUnit => price
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize(),
    }
}

/// Price produced by layering `layer` on top of `state`, without any precondition checks.
///
/// # Errors
///
/// - [`PricingError::Overflow`] when the arithmetic overflows.
/// - [`PricingError::Unavailable`] for a members based layer, which cannot be
///   priced from the entity alone.
pub fn layered_selling_price(state: &PriceState, layer: &AdminLayer) -> Result<Decimal, PricingError> {
    let base = match layer.base {
        PriceBase::Mrp => state.mrp,
        PriceBase::SellingPrice => state.selling_price,
        PriceBase::Members => return Err(PricingError::Unavailable),
    };

    discount_price(base, layer.percent).map(|price| round(price, layer.rounding))
}

/// Apply an admin level layer to an entity exactly once.
///
/// # Errors
///
/// - [`PricingError::Unavailable`] when the entity is inactive, blocked or deleted.
/// - [`PricingError::AlreadyDiscounted`] when a layer is already present.
/// - [`PricingError::InvalidDiscountValue`] when the layer could never be reversed.
/// - [`PricingError::NegativePrice`] when the result would be below zero.
pub fn apply_layer(state: &PriceState, layer: AdminLayer) -> Result<PriceState, PricingError> {
    if !state.availability.is_available() {
        return Err(PricingError::Unavailable);
    }

    if state.layer.is_some() {
        return Err(PricingError::AlreadyDiscounted);
    }

    layer.ensure_reversible()?;

    let selling_price = layered_selling_price(state, &layer)?;

    if selling_price < Decimal::ZERO {
        return Err(PricingError::NegativePrice(selling_price));
    }

    Ok(PriceState {
        selling_price,
        layer: Some(layer),
        ..*state
    })
}

/// Remove the layer created by `source`, restoring the price it replaced.
///
/// # Errors
///
/// - [`PricingError::NotApplied`] when the entity has no layer from `source`.
/// - [`PricingError::InvalidDiscountValue`] when a selling-price layer is 100%.
pub fn reverse_layer(state: &PriceState, source: LayerSource) -> Result<PriceState, PricingError> {
    let layer = match state.layer {
        Some(layer) if layer.source == source => layer,
        _ => return Err(PricingError::NotApplied),
    };

    let selling_price = match layer.base {
        PriceBase::Mrp | PriceBase::Members => {
            base_selling_price(state.mrp, state.base_discount)?
        }
        PriceBase::SellingPrice => {
            round(restore_price(state.selling_price, layer.percent)?, layer.rounding)
        }
    };

    Ok(PriceState {
        selling_price,
        layer: None,
        ..*state
    })
}

/// Replace whatever layer `source` currently holds with one at `percent`.
///
/// Leaves the state untouched when the percentage is unchanged.
///
/// # Errors
///
/// Propagates reversal and application failures.
pub fn relayer(state: &PriceState, layer: AdminLayer) -> Result<PriceState, PricingError> {
    match state.layer {
        Some(current) if current == layer => Ok(*state),
        Some(current) if current.source == layer.source => {
            apply_layer(&reverse_layer(state, layer.source)?, layer)
        }
        _ => apply_layer(state, layer),
    }
}
