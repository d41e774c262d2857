//! Prelude

pub use crate::{
    batch::{BatchFailure, BatchOutcome},
    bundle::{
        BundleLine, BundlePricing, apply_sale, bundle_sale_price, find_duplicate, new_members,
        price_bundle,
    },
    engine::{apply_layer, base_selling_price, discount_price, relayer, restore_price, reverse_layer},
    error::{ErrorKind, PricingError},
    percent::Percent,
    sale::{
        CategoryDiscount, CategoryPercentError, PricingAction, SaleOperation, SalePhase,
        bundle_percent, category_percent, validate_category_percent,
    },
    state::{AdminLayer, Availability, LayerSource, PriceBase, PriceState, Rounding},
    window::DateWindow,
};
