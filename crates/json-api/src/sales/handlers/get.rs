//! Get Sale Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    sales::{errors::into_status_error, models::SaleResponse},
    state::State,
};

/// Get Sale Handler
///
/// Returns the sale with its categories and enrolled members. The phase is
/// evaluated at the optional `at` query parameter, defaulting to now.
#[endpoint(
    tags("sales"),
    summary = "Get Sale",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Sale found"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<SaleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let point_in_time = at.into_point_in_time()?;

    let sale = state
        .app
        .sales
        .get_sale(sale.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(SaleResponse::at(sale, point_in_time)))
}
