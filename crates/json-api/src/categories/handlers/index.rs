//! Category Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::categories::records::CategorySort;

use crate::{
    categories::{errors::into_status_error, models::CategoryResponse},
    extensions::*,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoriesResponse {
    /// Categories on this page
    pub categories: Vec<CategoryResponse>,

    /// Current page
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total matching categories
    pub total: u64,
}

/// Category Index Handler
///
/// Returns a page of categories. Sortable by `name` or `created_at`.
#[endpoint(
    tags("categories"),
    summary = "List Categories",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(
    query: ListQueryParams,
    depot: &mut Depot,
) -> Result<Json<CategoriesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let params = query.into_list_params::<CategorySort>()?;

    let page = state
        .app
        .categories
        .list_categories(params)
        .await
        .map_err(into_status_error)?;

    Ok(Json(CategoriesResponse {
        categories: page.items.into_iter().map(Into::into).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::{
        categories::{MockCategoriesService, records::CategoryUuid},
        pagination::{Page, SortOrder},
    };

    use crate::test_helpers::categories_service;

    use super::{super::tests::make_category, *};

    fn make_service(categories: MockCategoriesService) -> Service {
        categories_service(categories, Router::with_path("categories").get(handler))
    }

    #[tokio::test]
    async fn test_index_returns_page() -> TestResult {
        let uuid = CategoryUuid::new();

        let mut categories = MockCategoriesService::new();

        categories
            .expect_list_categories()
            .once()
            .return_once(move |params| {
                Ok(Page {
                    items: vec![make_category(uuid, "Kitchen")],
                    page: params.page(),
                    limit: params.limit(),
                    total: 1,
                })
            });

        let response: CategoriesResponse = TestClient::get("http://example.com/categories")
            .send(&make_service(categories))
            .await
            .take_json()
            .await?;

        assert_eq!(response.total, 1);
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, 10);
        assert_eq!(
            response.categories.first().map(|c| c.uuid),
            Some(uuid.into_uuid())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_index_forwards_list_params() -> TestResult {
        let mut categories = MockCategoriesService::new();

        categories
            .expect_list_categories()
            .once()
            .withf(|params| {
                params.page() == 2
                    && params.limit() == 5
                    && params.sort_field() == CategorySort::Name
                    && params.sort_order() == SortOrder::Asc
                    && params.search() == Some("kit")
            })
            .return_once(|_| {
                Ok(Page {
                    items: Vec::new(),
                    page: 2,
                    limit: 5,
                    total: 0,
                })
            });

        let res = TestClient::get(
            "http://example.com/categories?page=2&limit=5&sort_field=name&sort_order=asc&search=kit",
        )
        .send(&make_service(categories))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_index_rejects_unknown_sort_field() -> TestResult {
        let mut categories = MockCategoriesService::new();

        categories.expect_list_categories().never();

        let res = TestClient::get("http://example.com/categories?sort_field=mrp")
            .send(&make_service(categories))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_index_rejects_oversized_limit() -> TestResult {
        let res = TestClient::get("http://example.com/categories?limit=500")
            .send(&make_service(MockCategoriesService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
