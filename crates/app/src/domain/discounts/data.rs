//! Discounts Data

use bazaar_pricing::state::PriceBase;
use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::{
    bundles::records::BundleUuid,
    discounts::records::DiscountUuid,
    pricing::records::EntityRef,
    products::records::ProductUuid,
};

/// New Discount Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscount {
    pub uuid: DiscountUuid,
    pub code: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub discount: Decimal,
    pub kind: PriceBase,
}

/// Products and bundles a discount is applied to or removed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountTargets {
    pub products: Vec<ProductUuid>,
    pub bundles: Vec<BundleUuid>,
}

impl DiscountTargets {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.bundles.is_empty()
    }

    /// Products first, then bundles, each in request order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityRef> {
        self.products
            .iter()
            .map(|product| EntityRef::product(product.into_uuid()))
            .chain(
                self.bundles
                    .iter()
                    .map(|bundle| EntityRef::bundle(bundle.into_uuid())),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::pricing::records::EntityKind;

    use super::*;

    #[test]
    fn entities_lists_products_before_bundles() {
        let product = ProductUuid::new();
        let bundle = BundleUuid::new();

        let targets = DiscountTargets {
            products: vec![product],
            bundles: vec![bundle],
        };

        let kinds: Vec<EntityKind> = targets.entities().iter().map(|e| e.kind).collect();

        assert_eq!(kinds, [EntityKind::Product, EntityKind::Bundle]);
        assert!(!targets.is_empty());
        assert!(DiscountTargets::default().is_empty());
    }
}
