//! Product Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::products::{data::ProductFilter, records::ProductSort};

use crate::{
    extensions::*,
    products::{errors::into_status_error, models::ProductResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductsResponse {
    /// Products on this page
    pub products: Vec<ProductResponse>,

    /// Current page
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total matching products
    pub total: u64,
}

/// Product Index Handler
///
/// Returns a page of products, optionally restricted to one category. Sortable
/// by `name`, `mrp`, `selling_price` or `created_at`.
#[endpoint(
    tags("products"),
    summary = "List Products",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(
    query: ListQueryParams,
    category: QueryParam<Uuid, false>,
    depot: &mut Depot,
) -> Result<Json<ProductsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let params = query.into_list_params::<ProductSort>()?;

    let filter = ProductFilter {
        category: category.into_inner().map(Into::into),
    };

    let page = state
        .app
        .products
        .list_products(params, filter)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ProductsResponse {
        products: page.items.into_iter().map(Into::into).collect(),
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
        categories::records::CategoryUuid,
        pagination::Page,
        products::{MockProductsService, ProductsServiceError, records::ProductUuid},
    };

    use crate::test_helpers::products_service;

    use super::{super::tests::make_product, *};

    fn make_service(products: MockProductsService) -> Service {
        products_service(products, Router::with_path("products").get(handler))
    }

    #[tokio::test]
    async fn test_index_returns_products() -> TestResult {
        let uuid_a = ProductUuid::new();
        let uuid_b = ProductUuid::new();

        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .withf(|_, filter| filter.category.is_none())
            .return_once(move |params, _| {
                Ok(Page {
                    items: vec![make_product(uuid_a), make_product(uuid_b)],
                    page: params.page(),
                    limit: params.limit(),
                    total: 2,
                })
            });

        let response: ProductsResponse = TestClient::get("http://example.com/products")
            .send(&make_service(products))
            .await
            .take_json()
            .await?;

        let uuids: Vec<Uuid> = response.products.iter().map(|p| p.uuid).collect();

        assert_eq!(uuids, [uuid_a.into_uuid(), uuid_b.into_uuid()]);
        assert_eq!(response.total, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_index_filters_by_category() -> TestResult {
        let category = CategoryUuid::new();

        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .withf(move |params, filter| {
                filter.category == Some(category) && params.sort_field() == ProductSort::Mrp
            })
            .return_once(|_, _| {
                Ok(Page {
                    items: Vec::new(),
                    page: 1,
                    limit: 10,
                    total: 0,
                })
            });

        let res = TestClient::get(format!(
            "http://example.com/products?category={category}&sort_field=mrp"
        ))
        .send(&make_service(products))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_index_storage_error_returns_500() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .return_once(|_, _| Err(ProductsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::get("http://example.com/products")
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
