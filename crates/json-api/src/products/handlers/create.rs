//! Create Product Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::products::data::NewProduct;

use crate::{
    extensions::*,
    products::{errors::into_status_error, models::ProductResponse},
    state::State,
};

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateProductRequest {
    /// Client supplied identifier; generated when absent
    pub uuid: Option<Uuid>,
    pub category_uuid: Uuid,
    pub name: String,
    /// List price
    pub mrp: Decimal,
    /// Seller discount percentage, 0 to 100
    #[serde(default)]
    pub discount: Decimal,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(request: CreateProductRequest) -> Self {
        NewProduct {
            uuid: request.uuid.unwrap_or_else(Uuid::now_v7).into(),
            category_uuid: request.category_uuid.into(),
            name: request.name.trim().to_string(),
            mrp: request.mrp,
            discount: request.discount,
        }
    }
}

/// Create Product Handler
///
/// The selling price is derived from the list price and the seller discount.
#[endpoint(
    tags("products"),
    summary = "Create Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
        (status_code = StatusCode::CONFLICT, description = "Product already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    if request.name.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Product name is required"));
    }

    if request.mrp.is_sign_negative() {
        return Err(StatusError::bad_request().brief("mrp must not be negative"));
    }

    let product = state
        .app
        .products
        .create_product(request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/products/{}", product.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(product.into()))
}
