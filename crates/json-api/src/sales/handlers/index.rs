//! Sale Index Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::sales::records::SaleSort;

use crate::{
    extensions::*,
    sales::{errors::into_status_error, models::SaleResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SalesResponse {
    /// Sales on this page
    pub sales: Vec<SaleResponse>,

    /// Current page
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total matching sales
    pub total: u64,
}

/// Sale Index Handler
///
/// Returns a page of sales, searchable by name. Sortable by `name`,
/// `start_date`, `end_date` or `created_at`.
#[endpoint(tags("sales"), summary = "List Sales", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    query: ListQueryParams,
    depot: &mut Depot,
) -> Result<Json<SalesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let params = query.into_list_params::<SaleSort>()?;

    let page = state
        .app
        .sales
        .list_sales(params)
        .await
        .map_err(into_status_error)?;

    let now = Timestamp::now();

    Ok(Json(SalesResponse {
        sales: page
            .items
            .into_iter()
            .map(|sale| SaleResponse::at(sale, now))
            .collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}
