//! Bundle Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::bundles::records::BundleSort;

use crate::{
    bundles::{errors::into_status_error, models::BundleResponse},
    extensions::*,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BundlesResponse {
    /// Bundles on this page
    pub bundles: Vec<BundleResponse>,

    /// Current page
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total matching bundles
    pub total: u64,
}

/// Bundle Index Handler
///
/// Returns a page of bundles. Sortable by `name`, `mrp`, `selling_price` or
/// `created_at`.
#[endpoint(
    tags("bundles"),
    summary = "List Bundles",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(
    query: ListQueryParams,
    depot: &mut Depot,
) -> Result<Json<BundlesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let params = query.into_list_params::<BundleSort>()?;

    let page = state
        .app
        .bundles
        .list_bundles(params)
        .await
        .map_err(into_status_error)?;

    Ok(Json(BundlesResponse {
        bundles: page.items.into_iter().map(Into::into).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}
