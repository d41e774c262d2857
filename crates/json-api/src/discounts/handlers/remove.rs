//! Remove Discount Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    discounts::{
        errors::into_status_error,
        models::{DiscountBatchResponse, DiscountTargetsRequest},
    },
    extensions::*,
    pricing::batch_parts,
    state::State,
};

/// Remove Discount Handler
///
/// Reverses the discount on each listed product and bundle, restoring the
/// price it had before. Targets that do not carry this discount are reported
/// in `errors`.
#[endpoint(
    tags("discounts"),
    summary = "Remove Discount",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-target results"),
        (status_code = StatusCode::NOT_FOUND, description = "Discount not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
#[tracing::instrument(
    name = "discounts.remove",
    skip(discount, json, depot),
    fields(discount_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    discount: PathParam<Uuid>,
    json: JsonBody<DiscountTargetsRequest>,
    depot: &mut Depot,
) -> Result<Json<DiscountBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let discount = discount.into_inner();

    tracing::Span::current().record("discount_uuid", tracing::field::display(discount));

    let outcome = state
        .app
        .discounts
        .remove_discount(discount.into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("discount_remove", outcome);

    Ok(Json(DiscountBatchResponse { results, errors }))
}
