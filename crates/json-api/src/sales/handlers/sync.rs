//! Sync Sale Pricing Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    pricing::batch_parts,
    sales::{errors::into_status_error, models::SaleSyncResponse},
    state::State,
};

/// Sync Sale Pricing Handler
///
/// Prices members enrolled while the sale was in the future once it has
/// started, and reverses every member once it has ended.
#[endpoint(
    tags("sales"),
    summary = "Sync Sale Pricing",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Members repriced"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
    ),
)]
#[tracing::instrument(
    name = "sales.sync",
    skip(sale, at, depot),
    fields(sale_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<SaleSyncResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let sale = sale.into_inner();

    tracing::Span::current().record("sale_uuid", tracing::field::display(sale));

    let outcome = state
        .app
        .sales
        .sync_sale_pricing(sale.into(), now)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("sale_sync", outcome);

    Ok(Json(SaleSyncResponse { results, errors }))
}
