//! Product Payloads

use std::string::ToString;

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::products::records::ProductRecord;

use crate::pricing::{AdminLayerResponse, layer_of};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    /// The unique identifier of the product
    pub uuid: Uuid,

    /// Category the product is listed in
    pub category_uuid: Uuid,

    /// Display name
    pub name: String,

    /// List price
    pub mrp: Decimal,

    /// Current selling price, including any admin layer
    pub selling_price: Decimal,

    /// Seller discount percentage
    pub discount: Decimal,

    /// Whether the product is listed
    pub is_active: bool,

    /// Whether moderation blocked the product
    pub is_blocked: bool,

    /// Admin level discount currently applied
    pub admin_discount: Option<AdminLayerResponse>,

    /// The date and time the product was created
    pub created_at: String,

    /// The date and time the product was last updated
    pub updated_at: String,

    /// The date and time the product was deleted
    pub deleted_at: Option<String>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        ProductResponse {
            admin_discount: layer_of(&product),
            uuid: product.uuid.into(),
            category_uuid: product.category_uuid.into(),
            name: product.name,
            mrp: product.mrp,
            selling_price: product.selling_price,
            discount: product.discount.value(),
            is_active: product.is_active,
            is_blocked: product.is_blocked,
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
            deleted_at: product.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}
