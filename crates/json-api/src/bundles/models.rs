//! Bundle Payloads

use std::string::ToString;

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::bundles::records::{BundleMember, BundleRecord};

use crate::pricing::{AdminLayerResponse, layer_of};

/// A product inside a bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub(crate) struct BundleMemberPayload {
    pub product_uuid: Uuid,
    /// Units of the product in the bundle
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl From<BundleMemberPayload> for BundleMember {
    fn from(member: BundleMemberPayload) -> Self {
        BundleMember {
            product_uuid: member.product_uuid.into(),
            quantity: member.quantity,
        }
    }
}

impl From<BundleMember> for BundleMemberPayload {
    fn from(member: BundleMember) -> Self {
        BundleMemberPayload {
            product_uuid: member.product_uuid.into(),
            quantity: member.quantity,
        }
    }
}

/// Reject zero quantities before they reach pricing.
pub(crate) fn members(payload: Vec<BundleMemberPayload>) -> Option<Vec<BundleMember>> {
    payload
        .into_iter()
        .map(|member| (member.quantity > 0).then(|| member.into()))
        .collect()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BundleResponse {
    /// The unique identifier of the bundle
    pub uuid: Uuid,

    /// Display name
    pub name: String,

    /// Sum of member list prices times quantities
    pub mrp: Decimal,

    /// Current selling price, including any admin layer
    pub selling_price: Decimal,

    /// Bundle discount percentage
    pub discount: Decimal,

    /// Member products
    pub products: Vec<BundleMemberPayload>,

    /// Admin that created the bundle
    pub created_by: Uuid,

    /// Whether the bundle is listed
    pub is_active: bool,

    /// Whether moderation blocked the bundle
    pub is_blocked: bool,

    /// Admin level discount currently applied
    pub admin_discount: Option<AdminLayerResponse>,

    /// The date and time the bundle was created
    pub created_at: String,

    /// The date and time the bundle was last updated
    pub updated_at: String,

    /// The date and time the bundle was deleted
    pub deleted_at: Option<String>,
}

impl From<BundleRecord> for BundleResponse {
    fn from(bundle: BundleRecord) -> Self {
        BundleResponse {
            admin_discount: layer_of(&bundle),
            uuid: bundle.uuid.into(),
            name: bundle.name,
            mrp: bundle.mrp,
            selling_price: bundle.selling_price,
            discount: bundle.discount.value(),
            products: bundle.products.into_iter().map(Into::into).collect(),
            created_by: bundle.created_by.uuid,
            is_active: bundle.is_active,
            is_blocked: bundle.is_blocked,
            created_at: bundle.created_at.to_string(),
            updated_at: bundle.updated_at.to_string(),
            deleted_at: bundle.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}
