//! Sale Payloads

use std::string::ToString;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::sales::records::{
    MembershipChange, SaleBundle, SaleCategory, SaleRecord,
};

use crate::pricing::{BatchFailureResponse, RepricedResponse};

/// A category in a sale and its percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleCategoryPayload {
    pub category_uuid: Uuid,
    /// Percentage taken off the selling price, above 0 and below 100
    pub discount: Decimal,
}

impl From<SaleCategory> for SaleCategoryPayload {
    fn from(category: SaleCategory) -> Self {
        SaleCategoryPayload {
            category_uuid: category.category_uuid.into(),
            discount: category.discount.value(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleBundleResponse {
    pub bundle_uuid: Uuid,

    /// `explicit` when enrolled directly, `automatic` when enrolled through
    /// a member product
    pub origin: String,
}

impl From<SaleBundle> for SaleBundleResponse {
    fn from(bundle: SaleBundle) -> Self {
        SaleBundleResponse {
            bundle_uuid: bundle.bundle_uuid.into(),
            origin: bundle.origin.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleResponse {
    /// The unique identifier of the sale
    pub uuid: Uuid,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Start of the sale
    pub start_date: String,

    /// End of the sale, inclusive
    pub end_date: String,

    /// `future`, `active` or `ended`
    pub phase: String,

    /// Whether the sale is running right now
    pub is_active: bool,

    /// Categories in scope and their percentages
    pub categories: Vec<SaleCategoryPayload>,

    /// Enrolled products
    pub products: Vec<Uuid>,

    /// Enrolled bundles
    pub bundles: Vec<SaleBundleResponse>,

    /// Admin that created the sale
    pub created_by: Uuid,

    /// The date and time the sale was created
    pub created_at: String,

    /// The date and time the sale was last updated
    pub updated_at: String,

    /// The date and time the sale was deleted
    pub deleted_at: Option<String>,
}

impl SaleResponse {
    pub(crate) fn at(sale: SaleRecord, now: Timestamp) -> Self {
        let phase = sale.phase(now);

        SaleResponse {
            phase: phase.as_str().to_string(),
            is_active: sale.is_active(now),
            uuid: sale.uuid.into(),
            name: sale.name,
            description: sale.description,
            start_date: sale.window.start().to_string(),
            end_date: sale.window.end().to_string(),
            categories: sale.categories.into_iter().map(Into::into).collect(),
            products: sale.products.into_iter().map(Into::into).collect(),
            bundles: sale.bundles.into_iter().map(Into::into).collect(),
            created_by: sale.created_by.uuid,
            created_at: sale.created_at.to_string(),
            updated_at: sale.updated_at.to_string(),
            deleted_at: sale.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}

impl From<SaleRecord> for SaleResponse {
    fn from(sale: SaleRecord) -> Self {
        Self::at(sale, Timestamp::now())
    }
}

/// Products to enroll in or withdraw from a sale.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleProductsRequest {
    pub products: Vec<Uuid>,
}

/// Bundles to enroll in or withdraw from a sale.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleBundlesRequest {
    pub bundles: Vec<Uuid>,
}

/// The outcome of enrolling or withdrawing one entity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MembershipChangeResponse {
    /// `product` or `bundle`
    pub kind: String,

    /// Entity UUID
    pub uuid: Uuid,

    /// New pricing of the entity, absent when its price did not change
    pub repriced: Option<RepricedResponse>,

    /// Bundles enrolled, withdrawn or repriced as a consequence
    pub bundles: Vec<Uuid>,
}

impl From<MembershipChange> for MembershipChangeResponse {
    fn from(change: MembershipChange) -> Self {
        MembershipChangeResponse {
            kind: change.entity.kind.as_str().to_string(),
            uuid: change.entity.uuid,
            repriced: change.repriced.map(Into::into),
            bundles: change.bundles.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MembershipBatchResponse {
    /// Entities processed
    pub results: Vec<MembershipChangeResponse>,

    /// Entities that were skipped, with the reason
    pub errors: Vec<BatchFailureResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleSyncResponse {
    /// Members whose price changed
    pub results: Vec<RepricedResponse>,

    /// Members that could not be repriced
    pub errors: Vec<BatchFailureResponse>,
}
