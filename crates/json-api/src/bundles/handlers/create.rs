//! Create Bundle Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::bundles::data::NewBundle;

use crate::{
    bundles::{
        errors::into_status_error,
        models::{BundleMemberPayload, BundleResponse, members},
    },
    extensions::*,
    state::State,
};

/// Create Bundle Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateBundleRequest {
    /// Client supplied identifier; generated when absent
    pub uuid: Option<Uuid>,
    pub name: String,
    /// Bundle discount percentage, 0 to 100
    #[serde(default)]
    pub discount: Decimal,
    /// Member products, each listed once
    pub products: Vec<BundleMemberPayload>,
}

/// Create Bundle Handler
///
/// Every member must be active, unblocked and not deleted. The bundle list
/// price is the sum of member list prices times quantities.
#[endpoint(
    tags("bundles"),
    summary = "Create Bundle",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Bundle created"),
        (status_code = StatusCode::CONFLICT, description = "Duplicate product or bundle"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "bundles.create",
    skip(json, depot, res),
    fields(products_count = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateBundleRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<BundleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;
    let request = json.into_inner();

    tracing::Span::current().record("products_count", request.products.len());

    if request.name.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Bundle name is required"));
    }

    if request.products.is_empty() {
        return Err(StatusError::bad_request().brief("A bundle needs at least one product"));
    }

    let products = members(request.products)
        .ok_or_else(|| StatusError::bad_request().brief("Quantities must be at least 1"))?;

    let bundle = state
        .app
        .bundles
        .create_bundle(NewBundle {
            uuid: request.uuid.unwrap_or_else(Uuid::now_v7).into(),
            name: request.name.trim().to_string(),
            discount: request.discount,
            products,
            created_by: principal,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/bundles/{}", bundle.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(bundle.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::{
        bundles::{
            BundlesServiceError, MockBundlesService,
            records::{BundleMember, BundleUuid},
        },
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_ADMIN, bundles_service};

    use super::{super::tests::make_bundle, *};

    fn make_service(bundles: MockBundlesService) -> Service {
        bundles_service(bundles, Router::with_path("bundles").post(handler))
    }

    #[tokio::test]
    async fn test_create_bundle_success() -> TestResult {
        let uuid = BundleUuid::new();
        let kettle = ProductUuid::new();
        let toaster = ProductUuid::new();
        let bundle = make_bundle(uuid, &[kettle, toaster]);

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_create_bundle()
            .once()
            .withf(move |new| {
                new.uuid == uuid
                    && new.created_by == TEST_ADMIN
                    && new.discount == Decimal::TEN
                    && new.products
                        == [
                            BundleMember {
                                product_uuid: kettle,
                                quantity: 2,
                            },
                            BundleMember::single(toaster),
                        ]
            })
            .return_once(move |_| Ok(bundle));

        let mut res = TestClient::post("http://example.com/bundles")
            .json(&json!({
                "uuid": uuid.into_uuid(),
                "name": "Breakfast set",
                "discount": 10,
                "products": [
                    { "product_uuid": kettle.into_uuid(), "quantity": 2 },
                    { "product_uuid": toaster.into_uuid() },
                ],
            }))
            .send(&make_service(bundles))
            .await;

        let body: BundleResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.mrp, Decimal::new(3000, 0));
        assert_eq!(body.selling_price, Decimal::new(2700, 0));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_bundle_duplicate_product_returns_409() -> TestResult {
        let product = ProductUuid::new();

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_create_bundle()
            .once()
            .return_once(move |_| Err(BundlesServiceError::DuplicateProduct(product)));

        let res = TestClient::post("http://example.com/bundles")
            .json(&json!({
                "name": "Twins",
                "products": [
                    { "product_uuid": product.into_uuid() },
                    { "product_uuid": product.into_uuid() },
                ],
            }))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_bundle_without_products_returns_400() -> TestResult {
        let mut bundles = MockBundlesService::new();

        bundles.expect_create_bundle().never();

        let res = TestClient::post("http://example.com/bundles")
            .json(&json!({ "name": "Empty", "products": [] }))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_bundle_unavailable_product_returns_400() -> TestResult {
        let product = ProductUuid::new();

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_create_bundle()
            .once()
            .return_once(move |_| Err(BundlesServiceError::UnavailableProduct(product)));

        let res = TestClient::post("http://example.com/bundles")
            .json(&json!({
                "name": "Blocked",
                "products": [{ "product_uuid": product.into_uuid() }],
            }))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
