//! Unblock Product Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    products::{errors::into_status_error, models::ProductResponse},
    state::State,
};

/// Unblock Product Handler
#[endpoint(
    tags("products"),
    summary = "Unblock Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Moderation updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid product id"),
    ),
)]
#[tracing::instrument(
    name = "products.unblock",
    skip(product, depot),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let product = product.into_inner();

    tracing::Span::current().record("product_uuid", tracing::field::display(product));

    let product = state
        .app
        .products
        .unblock_product(product.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}
