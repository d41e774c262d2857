//! Create Sale Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::sales::data::{NewSale, NewSaleCategory};

use crate::{
    extensions::*,
    sales::{
        errors::into_status_error,
        models::{SaleCategoryPayload, SaleResponse},
    },
    state::State,
};

/// Create Sale Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateSaleRequest {
    /// Client supplied identifier; generated when absent
    pub uuid: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    /// RFC 3339 start of the sale
    pub start_date: String,
    /// RFC 3339 end of the sale, inclusive
    pub end_date: String,
    /// Categories in scope, each with its own percentage
    pub categories: Vec<SaleCategoryPayload>,
}

/// Create Sale Handler
///
/// Sales start with no members. Category percentages must be above 0 and
/// below 100.
#[endpoint(
    tags("sales"),
    summary = "Create Sale",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Sale created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Percentage cannot be reversed"),
    ),
)]
#[tracing::instrument(
    name = "sales.create",
    skip(json, depot, res),
    fields(category_count = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateSaleRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SaleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;
    let request = json.into_inner();

    tracing::Span::current().record("category_count", request.categories.len());

    if request.name.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Sale name is required"));
    }

    if request.categories.is_empty() {
        return Err(StatusError::bad_request().brief("A sale needs at least one category"));
    }

    let sale = state
        .app
        .sales
        .create_sale(NewSale {
            uuid: request.uuid.unwrap_or_else(Uuid::now_v7).into(),
            name: request.name.trim().to_string(),
            description: request.description,
            start_date: parse_timestamp(&request.start_date, "start_date")?,
            end_date: parse_timestamp(&request.end_date, "end_date")?,
            categories: request
                .categories
                .into_iter()
                .map(|category| NewSaleCategory {
                    category_uuid: category.category_uuid.into(),
                    discount: category.discount,
                })
                .collect(),
            created_by: principal,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/sales/{}", sale.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(sale.into()))
}
