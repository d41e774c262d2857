//! Discount Payloads

use std::string::ToString;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::discounts::{data::DiscountTargets, records::DiscountRecord};

use crate::pricing::{BatchFailureResponse, RepricedResponse};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountResponse {
    /// The unique identifier of the discount
    pub uuid: Uuid,

    /// Discount code
    pub code: String,

    /// Start of the active window
    pub start_date: String,

    /// End of the active window, inclusive
    pub end_date: String,

    /// Percentage taken off
    pub discount: Decimal,

    /// Price the percentage is taken from: `MRP` or `sellingPrice`
    pub kind: String,

    /// Whether the discount can be applied right now
    pub is_active: bool,

    /// Products currently carrying this discount
    pub products: Vec<Uuid>,

    /// Bundles currently carrying this discount
    pub bundles: Vec<Uuid>,

    /// The date and time the discount was created
    pub created_at: String,

    /// The date and time the discount was last updated
    pub updated_at: String,

    /// The date and time the discount was deleted
    pub deleted_at: Option<String>,
}

impl DiscountResponse {
    pub(crate) fn at(discount: DiscountRecord, now: Timestamp) -> Self {
        DiscountResponse {
            is_active: discount.is_active(now),
            uuid: discount.uuid.into(),
            code: discount.code,
            start_date: discount.window.start().to_string(),
            end_date: discount.window.end().to_string(),
            discount: discount.discount.value(),
            kind: discount.kind.as_str().to_string(),
            products: discount.product_uuids.into_iter().map(Into::into).collect(),
            bundles: discount.bundle_uuids.into_iter().map(Into::into).collect(),
            created_at: discount.created_at.to_string(),
            updated_at: discount.updated_at.to_string(),
            deleted_at: discount.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}

impl From<DiscountRecord> for DiscountResponse {
    fn from(discount: DiscountRecord) -> Self {
        Self::at(discount, Timestamp::now())
    }
}

/// Products and bundles to apply a discount to or remove it from.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountTargetsRequest {
    #[serde(default)]
    pub products: Vec<Uuid>,
    #[serde(default)]
    pub bundles: Vec<Uuid>,
}

impl From<DiscountTargetsRequest> for DiscountTargets {
    fn from(request: DiscountTargetsRequest) -> Self {
        DiscountTargets {
            products: request.products.into_iter().map(Into::into).collect(),
            bundles: request.bundles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-target outcome of applying or removing a discount.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountBatchResponse {
    /// Targets that were repriced
    pub results: Vec<RepricedResponse>,

    /// Targets that were skipped, with the reason
    pub errors: Vec<BatchFailureResponse>,
}
