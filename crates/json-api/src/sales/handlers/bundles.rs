//! Sale Bundle Membership Handlers

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    pricing::batch_parts,
    sales::{
        errors::into_status_error,
        models::{MembershipBatchResponse, SaleBundlesRequest},
    },
    state::State,
};

/// Enroll Sale Bundles Handler
///
/// A bundle needs at least one member product in a sale category. It is
/// priced with the largest matching category percentage.
#[endpoint(
    tags("sales"),
    summary = "Enroll Sale Bundles",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-bundle results"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::CONFLICT, description = "Sale has ended"),
    ),
)]
#[tracing::instrument(
    name = "sales.enroll_bundles",
    skip(sale, at, json, depot),
    fields(sale_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn enroll(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    json: JsonBody<SaleBundlesRequest>,
    depot: &mut Depot,
) -> Result<Json<MembershipBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let sale = sale.into_inner();

    tracing::Span::current().record("sale_uuid", tracing::field::display(sale));

    let bundles = json.into_inner().bundles.into_iter().map(Into::into).collect();

    let outcome = state
        .app
        .sales
        .enroll_bundles(sale.into(), bundles, now)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("sale_enroll_bundles", outcome);

    Ok(Json(MembershipBatchResponse { results, errors }))
}

/// Withdraw Sale Bundles Handler
#[endpoint(
    tags("sales"),
    summary = "Withdraw Sale Bundles",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-bundle results"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::CONFLICT, description = "Sale has ended"),
    ),
)]
#[tracing::instrument(
    name = "sales.withdraw_bundles",
    skip(sale, at, json, depot),
    fields(sale_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn withdraw(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    json: JsonBody<SaleBundlesRequest>,
    depot: &mut Depot,
) -> Result<Json<MembershipBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let sale = sale.into_inner();

    tracing::Span::current().record("sale_uuid", tracing::field::display(sale));

    let bundles = json.into_inner().bundles.into_iter().map(Into::into).collect();

    let outcome = state
        .app
        .sales
        .withdraw_bundles(sale.into(), bundles, now)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("sale_withdraw_bundles", outcome);

    Ok(Json(MembershipBatchResponse { results, errors }))
}
