//! Shared pricing payloads and error mapping.

use bazaar_app::domain::pricing::records::{Layered, RepricedEntity};
use bazaar_pricing::{
    batch::{BatchFailure, BatchOutcome},
    error::PricingError,
    state::AdminLayer,
};
use rust_decimal::Decimal;
use salvo::{http::StatusError, oapi::ToSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observability::observe_batch;

/// The admin level discount currently layered on a product or bundle.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdminLayerResponse {
    /// `discount` or `sale`
    pub source: String,

    /// UUID of the discount or sale
    pub source_uuid: Uuid,

    /// Percentage applied
    pub percent: Decimal,

    /// `MRP` or `sellingPrice`
    pub base: String,
}

impl From<AdminLayer> for AdminLayerResponse {
    fn from(layer: AdminLayer) -> Self {
        AdminLayerResponse {
            source: layer.source.kind_str().to_string(),
            source_uuid: layer.source.uuid(),
            percent: layer.percent.value(),
            base: layer.base.as_str().to_string(),
        }
    }
}

/// Layer view of any record carrying an admin layer.
pub(crate) fn layer_of(record: &impl Layered) -> Option<AdminLayerResponse> {
    record.adjustment().map(Into::into)
}

/// New pricing of one product or bundle.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RepricedResponse {
    /// `product` or `bundle`
    pub kind: String,

    /// Entity UUID
    pub uuid: Uuid,

    /// Selling price after the change
    pub selling_price: Decimal,

    /// Admin layer after the change
    pub layer: Option<AdminLayerResponse>,
}

impl From<RepricedEntity> for RepricedResponse {
    fn from(repriced: RepricedEntity) -> Self {
        RepricedResponse {
            kind: repriced.entity.kind.as_str().to_string(),
            uuid: repriced.entity.uuid,
            selling_price: repriced.selling_price,
            layer: repriced.layer.map(Into::into),
        }
    }
}

/// A failed item of a batch request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BatchFailureResponse {
    /// Item UUID
    pub uuid: Uuid,

    /// Stable error kind, e.g. `already_discounted`
    pub kind: String,

    /// Human readable message
    pub message: String,
}

impl From<BatchFailure<Uuid>> for BatchFailureResponse {
    fn from(failure: BatchFailure<Uuid>) -> Self {
        BatchFailureResponse {
            uuid: failure.uuid,
            kind: failure.kind.to_string(),
            message: failure.message,
        }
    }
}

/// Split a batch outcome into response parts, counting items per outcome.
pub(crate) fn batch_parts<T, U>(
    operation: &str,
    outcome: BatchOutcome<Uuid, T>,
) -> (Vec<U>, Vec<BatchFailureResponse>)
where
    U: From<T>,
{
    observe_batch(operation, outcome.results.len(), outcome.errors.len());

    (
        outcome.results.into_iter().map(Into::into).collect(),
        outcome.errors.into_iter().map(Into::into).collect(),
    )
}

/// Status for a pricing rule violation.
pub(crate) fn pricing_status_error(error: &PricingError) -> StatusError {
    let status = match error {
        PricingError::InvalidPercentage(_)
        | PricingError::Unavailable
        | PricingError::InvalidWindow => StatusError::bad_request(),
        PricingError::AlreadyDiscounted | PricingError::NotApplied | PricingError::SaleEnded => {
            StatusError::conflict()
        }
        PricingError::NegativePrice(_)
        | PricingError::InvalidDiscountValue
        | PricingError::Overflow => StatusError::unprocessable_entity(),
    };

    status.brief(error.to_string())
}
