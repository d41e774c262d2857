//! Products Data

use rust_decimal::Decimal;

use crate::domain::{categories::records::CategoryUuid, products::records::ProductUuid};

/// New Product Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub category_uuid: CategoryUuid,
    pub name: String,
    pub mrp: Decimal,
    pub discount: Decimal,
}

/// Product list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategoryUuid>,
}
