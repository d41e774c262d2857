//! Get Discount Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    discounts::{errors::into_status_error, models::DiscountResponse},
    extensions::*,
    state::State,
};

/// Get Discount Handler
///
/// Returns the discount with the products and bundles it currently layers.
#[endpoint(
    tags("discounts"),
    summary = "Get Discount",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Discount found"),
        (status_code = StatusCode::NOT_FOUND, description = "Discount not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    discount: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<DiscountResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let discount = state
        .app
        .discounts
        .get_discount(discount.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(discount.into()))
}
