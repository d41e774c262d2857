//! Apply Discount Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam, QueryParam},
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

/// Apply Discount Handler
///
/// Layers the discount onto each listed product and bundle. Targets are
/// processed independently; a target that cannot take the discount is
/// reported in `errors` without affecting the others. The optional `at`
/// query parameter sets the point in time the discount must be active at.
#[endpoint(
    tags("discounts"),
    summary = "Apply Discount",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-target results"),
        (status_code = StatusCode::NOT_FOUND, description = "Discount not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Discount inactive or bad request"),
    ),
)]
#[tracing::instrument(
    name = "discounts.apply",
    skip(discount, at, json, depot),
    fields(discount_uuid = tracing::field::Empty, targets = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    discount: PathParam<Uuid>,
    at: QueryParam<String, false>,
    json: JsonBody<DiscountTargetsRequest>,
    depot: &mut Depot,
) -> Result<Json<DiscountBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let point_in_time = at.into_point_in_time()?;
    let discount = discount.into_inner();
    let request = json.into_inner();

    let span = tracing::Span::current();
    span.record("discount_uuid", tracing::field::display(discount));
    span.record("targets", request.products.len() + request.bundles.len());

    let outcome = state
        .app
        .discounts
        .apply_discount(discount.into(), request.into(), point_in_time)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("discount_apply", outcome);

    Ok(Json(DiscountBatchResponse { results, errors }))
}
