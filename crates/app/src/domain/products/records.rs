//! Product Records

use bazaar_pricing::{percent::Percent, state::AdminLayer};
use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{categories::records::CategoryUuid, pagination::SortField, pricing::records::Layered},
    uuids::TypedUuid,
};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub category_uuid: CategoryUuid,
    pub name: String,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub discount: Percent,
    pub is_active: bool,
    pub is_blocked: bool,
    pub adjustment: Option<AdminLayer>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Layered for ProductRecord {
    fn adjustment(&self) -> Option<AdminLayer> {
        self.adjustment
    }
}

/// Product list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    Name,
    Mrp,
    SellingPrice,
    #[default]
    CreatedAt,
}

impl SortField for ProductSort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "mrp" => Some(Self::Mrp),
            "selling_price" => Some(Self::SellingPrice),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Mrp => "mrp",
            Self::SellingPrice => "selling_price",
            Self::CreatedAt => "created_at",
        }
    }
}
