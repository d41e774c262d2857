//! Discount Index Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::discounts::records::DiscountSort;

use crate::{
    discounts::{errors::into_status_error, models::DiscountResponse},
    extensions::*,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountsResponse {
    /// Discounts on this page
    pub discounts: Vec<DiscountResponse>,

    /// Current page
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total matching discounts
    pub total: u64,
}

/// Discount Index Handler
///
/// Returns a page of discounts, searchable by code. Sortable by `code`,
/// `discount`, `start_date`, `end_date` or `created_at`.
#[endpoint(
    tags("discounts"),
    summary = "List Discounts",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(
    query: ListQueryParams,
    depot: &mut Depot,
) -> Result<Json<DiscountsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let params = query.into_list_params::<DiscountSort>()?;

    let page = state
        .app
        .discounts
        .list_discounts(params)
        .await
        .map_err(into_status_error)?;

    let now = Timestamp::now();

    Ok(Json(DiscountsResponse {
        discounts: page
            .items
            .into_iter()
            .map(|discount| DiscountResponse::at(discount, now))
            .collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::state::PriceBase;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::{
        discounts::{MockDiscountsService, records::DiscountUuid},
        pagination::{Page, SortOrder},
    };

    use crate::test_helpers::discounts_service;

    use super::{super::tests::make_discount, *};

    fn make_service(discounts: MockDiscountsService) -> Service {
        discounts_service(discounts, Router::with_path("discounts").get(handler))
    }

    #[tokio::test]
    async fn test_index_passes_sort_and_search() -> TestResult {
        let discount = make_discount(DiscountUuid::new(), PriceBase::Mrp)?;

        let mut discounts = MockDiscountsService::new();

        discounts
            .expect_list_discounts()
            .once()
            .withf(|params| {
                params.sort_field() == DiscountSort::Code
                    && params.sort_order() == SortOrder::Asc
                    && params.search() == Some("WIN")
            })
            .return_once(move |_| {
                Ok(Page {
                    items: vec![discount],
                    page: 1,
                    limit: 20,
                    total: 1,
                })
            });

        let response: DiscountsResponse = TestClient::get(
            "http://example.com/discounts?sort_field=code&sort_order=asc&search=WIN",
        )
        .send(&make_service(discounts))
        .await
        .take_json()
        .await?;

        assert_eq!(response.total, 1);
        assert_eq!(
            response.discounts.first().map(|d| d.kind.as_str()),
            Some("MRP")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_index_unknown_sort_field_returns_400() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts.expect_list_discounts().never();

        let res = TestClient::get("http://example.com/discounts?sort_field=colour")
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
