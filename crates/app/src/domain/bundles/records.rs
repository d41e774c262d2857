//! Bundle Records

use bazaar_pricing::{percent::Percent, state::AdminLayer};
use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    auth::Principal,
    domain::{
        pagination::SortField,
        pricing::records::Layered,
        products::records::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Bundle UUID
pub type BundleUuid = TypedUuid<BundleRecord>;

/// A product and its quantity inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleMember {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

impl BundleMember {
    #[must_use]
    pub const fn single(product_uuid: ProductUuid) -> Self {
        Self {
            product_uuid,
            quantity: 1,
        }
    }
}

/// Bundle Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRecord {
    pub uuid: BundleUuid,
    pub name: String,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub discount: Percent,
    pub products: Vec<BundleMember>,
    pub created_by: Principal,
    pub is_active: bool,
    pub is_blocked: bool,
    pub adjustment: Option<AdminLayer>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Layered for BundleRecord {
    fn adjustment(&self) -> Option<AdminLayer> {
        self.adjustment
    }
}

/// Bundle list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundleSort {
    Name,
    Mrp,
    SellingPrice,
    #[default]
    CreatedAt,
}

impl SortField for BundleSort {
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
