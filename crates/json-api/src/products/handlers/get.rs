//! Get Product Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    products::{errors::into_status_error, models::ProductResponse},
    state::State,
};

/// Get Product Handler
///
/// Returns a product together with the admin layer it carries.
#[endpoint(
    tags("products"),
    summary = "Get Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Product found"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid product id"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let product = state
        .app
        .products
        .get_product(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::{percent::Percent, state::AdminLayer};
    use rust_decimal::Decimal;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::products::{
        MockProductsService, ProductsServiceError, records::ProductUuid,
    };

    use crate::test_helpers::products_service;

    use super::{super::tests::make_product, *};

    fn make_service(products: MockProductsService) -> Service {
        products_service(products, Router::with_path("products/{product}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_admin_layer() -> TestResult {
        let uuid = ProductUuid::new();
        let sale = Uuid::now_v7();

        let mut product = make_product(uuid);

        product.selling_price = Decimal::new(630, 0);
        product.adjustment = Some(AdminLayer::sale(sale, Percent::whole(30)?));

        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(move |_| Ok(product));

        let response: ProductResponse =
            TestClient::get(format!("http://example.com/products/{uuid}"))
                .send(&make_service(products))
                .await
                .take_json()
                .await?;

        let layer = response.admin_discount.ok_or("missing admin layer")?;

        assert_eq!(response.selling_price, Decimal::new(630, 0));
        assert_eq!(layer.source, "sale");
        assert_eq!(layer.source_uuid, sale);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_product_returns_404() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .once()
            .return_once(|_| Err(ProductsServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/products/{}", ProductUuid::new()))
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_invalid_uuid_returns_400() -> TestResult {
        let res = TestClient::get("http://example.com/products/123")
            .send(&make_service(MockProductsService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
