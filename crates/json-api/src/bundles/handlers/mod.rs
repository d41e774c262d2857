//! Bundle Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod members;
pub(crate) mod update;

#[cfg(test)]
mod tests {
    use bazaar_pricing::percent::Percent;
    use jiff::Timestamp;
    use rust_decimal::Decimal;

    use bazaar_app::{
        domain::bundles::records::{BundleMember, BundleRecord, BundleUuid},
        domain::products::records::ProductUuid,
    };

    use crate::test_helpers::TEST_ADMIN;

    pub(super) fn make_bundle(uuid: BundleUuid, products: &[ProductUuid]) -> BundleRecord {
        BundleRecord {
            uuid,
            name: "Breakfast set".to_string(),
            mrp: Decimal::new(3000, 0),
            selling_price: Decimal::new(2700, 0),
            discount: Percent::new(Decimal::TEN).unwrap_or_default(),
            products: products.iter().copied().map(BundleMember::single).collect(),
            created_by: TEST_ADMIN,
            is_active: !products.is_empty(),
            is_blocked: false,
            adjustment: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }
}
