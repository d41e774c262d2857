//! Bundle Aggregate Pricing
//!
//! A bundle's list price is the quantity weighted sum of its members' list prices.
//! The bundle's own discount is applied on top, followed by whatever admin layer the
//! bundle carries.
//!
//! A sale prices a bundle from its members instead:
//! `round(Σ(member selling price × quantity) × (1 - p/100))`, where a member's
//! selling price is taken before that same sale's layer. Reversal restores the
//! bundle's own discounted price.

use std::hash::Hash;

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::{
    engine::{self, base_selling_price, discount_price, reverse_layer},
    error::PricingError,
    percent::Percent,
    state::{AdminLayer, Availability, LayerSource, PriceBase, PriceState, Rounding},
};

/// A member product as seen by bundle pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleLine {
    /// Member list price.
    pub mrp: Decimal,
    /// Member selling price a sale is taken from.
    pub selling_price: Decimal,
    /// Units of the member in the bundle.
    pub quantity: u32,
}

impl BundleLine {
    /// A line from explicit prices.
    #[must_use]
    pub const fn new(mrp: Decimal, selling_price: Decimal, quantity: u32) -> Self {
        Self {
            mrp,
            selling_price,
            quantity,
        }
    }

    /// A line for a member at its current selling price.
    #[must_use]
    pub const fn member(state: &PriceState, quantity: u32) -> Self {
        Self::new(state.mrp, state.selling_price, quantity)
    }

    /// A line for a member at its selling price before any layer `sale` put on it.
    ///
    /// # Errors
    ///
    /// Propagates a failure to reverse the member's layer.
    pub fn before_sale(
        state: &PriceState,
        quantity: u32,
        sale: LayerSource,
    ) -> Result<Self, PricingError> {
        let state = if state.is_layered_by(sale) {
            reverse_layer(state, sale)?
        } else {
            *state
        };

        Ok(Self::member(&state, quantity))
    }
}

/// Outcome of pricing a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlePricing {
    /// The bundle has members and a computed price.
    Priced {
        /// Quantity weighted sum of member list prices.
        mrp: Decimal,
        /// Price after the bundle discount and any admin layer.
        selling_price: Decimal,
    },

    /// The bundle has no members; it must be deactivated and its price left alone.
    Empty,
}

/// `Σ(mrp × quantity)` over the bundle members.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum overflows.
pub fn bundle_mrp(lines: &[BundleLine]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        line.mrp
            .checked_mul(Decimal::from(line.quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(PricingError::Overflow)
    })
}

/// `Σ(selling_price × quantity)` over the bundle members.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum overflows.
pub fn members_selling_price(lines: &[BundleLine]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        line.selling_price
            .checked_mul(Decimal::from(line.quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(PricingError::Overflow)
    })
}

/// Sale price of a bundle: the members' summed selling price less `percent`,
/// rounded to whole units.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the arithmetic overflows.
pub fn bundle_sale_price(lines: &[BundleLine], percent: Percent) -> Result<Decimal, PricingError> {
    let total = members_selling_price(lines)?;

    discount_price(total, percent).map(|price| engine::round(price, Rounding::WholeUnit))
}

/// Put `sale` on a bundle at `percent`, pricing it from `lines`.
///
/// A layer the same sale already holds is replaced, so the bundle follows its
/// members and the sale's largest category percentage.
///
/// # Errors
///
/// - [`PricingError::Unavailable`] when the bundle is inactive, blocked, deleted or
///   has no members.
/// - [`PricingError::AlreadyDiscounted`] when another source holds a layer.
/// - [`PricingError::NegativePrice`] when the result would be below zero.
pub fn apply_sale(
    state: &PriceState,
    sale: Uuid,
    percent: Percent,
    lines: &[BundleLine],
) -> Result<PriceState, PricingError> {
    if !state.availability.is_available() || lines.is_empty() {
        return Err(PricingError::Unavailable);
    }

    let source = LayerSource::Sale(sale);

    let unlayered = match state.layer {
        None => *state,
        Some(layer) if layer.source == source => reverse_layer(state, source)?,
        Some(_) => return Err(PricingError::AlreadyDiscounted),
    };

    let selling_price = bundle_sale_price(lines, percent)?;

    if selling_price < Decimal::ZERO {
        return Err(PricingError::NegativePrice(selling_price));
    }

    Ok(PriceState {
        selling_price,
        layer: Some(AdminLayer::bundle_sale(sale, percent)),
        ..unlayered
    })
}

/// Price a bundle from its members, its own discount and an optional admin layer.
///
/// The admin layer is re-applied on top of the freshly computed price so a layered
/// bundle stays layered after its membership changes. A members based sale layer
/// is recomputed from the lines' selling prices.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] on arithmetic overflow and
/// [`PricingError::NegativePrice`] if a member carries a negative list price.
pub fn price_bundle(
    lines: &[BundleLine],
    discount: Percent,
    layer: Option<AdminLayer>,
) -> Result<BundlePricing, PricingError> {
    if lines.is_empty() {
        return Ok(BundlePricing::Empty);
    }

    let mrp = bundle_mrp(lines)?;
    let selling_price = base_selling_price(mrp, discount)?;

    if selling_price < Decimal::ZERO {
        return Err(PricingError::NegativePrice(selling_price));
    }

    let selling_price = match layer {
        Some(layer) if layer.base == PriceBase::Members => {
            bundle_sale_price(lines, layer.percent)?
        }
        Some(layer) => {
            let state = PriceState {
                mrp,
                selling_price,
                base_discount: discount,
                layer: None,
                availability: Availability::available(),
            };

            engine::layered_selling_price(&state, &layer)?
        }
        None => selling_price,
    };

    Ok(BundlePricing::Priced { mrp, selling_price })
}

/// First identifier that appears more than once, if any.
#[must_use]
pub fn find_duplicate<T>(ids: &[T]) -> Option<T>
where
    T: Copy + Eq + Hash,
{
    let mut seen = FxHashSet::default();

    ids.iter().copied().find(|id| !seen.insert(*id))
}

/// Identifiers from `requested` not already present in `existing`, first occurrence
/// order, without repeats.
#[must_use]
pub fn new_members<T>(existing: &[T], requested: &[T]) -> SmallVec<[T; 8]>
where
    T: Copy + Eq + Hash,
{
    let mut seen: FxHashSet<T> = existing.iter().copied().collect();

    requested
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
