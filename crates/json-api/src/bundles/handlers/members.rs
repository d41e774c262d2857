//! Bundle Member Handlers

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    bundles::{
        errors::into_status_error,
        models::{BundleMemberPayload, BundleResponse, members},
    },
    extensions::*,
    state::State,
};

/// Add Bundle Products Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddBundleProductsRequest {
    pub products: Vec<BundleMemberPayload>,
}

/// Remove Bundle Products Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RemoveBundleProductsRequest {
    pub products: Vec<Uuid>,
}

/// Add Bundle Products Handler
///
/// Products already in the bundle are skipped.
#[endpoint(
    tags("bundles"),
    summary = "Add Bundle Products",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Products added"),
        (status_code = StatusCode::NOT_FOUND, description = "Bundle not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn add(
    bundle: PathParam<Uuid>,
    json: JsonBody<AddBundleProductsRequest>,
    depot: &mut Depot,
) -> Result<Json<BundleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let products = members(json.into_inner().products)
        .ok_or_else(|| StatusError::bad_request().brief("Quantities must be at least 1"))?;

    let bundle = state
        .app
        .bundles
        .add_products(bundle.into_inner().into(), products)
        .await
        .map_err(into_status_error)?;

    Ok(Json(bundle.into()))
}

/// Remove Bundle Products Handler
///
/// A bundle left without products is deactivated and keeps its last prices.
#[endpoint(
    tags("bundles"),
    summary = "Remove Bundle Products",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Products removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Bundle not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn remove(
    bundle: PathParam<Uuid>,
    json: JsonBody<RemoveBundleProductsRequest>,
    depot: &mut Depot,
) -> Result<Json<BundleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let products = json
        .into_inner()
        .products
        .into_iter()
        .map(Into::into)
        .collect();

    let bundle = state
        .app
        .bundles
        .remove_products(bundle.into_inner().into(), products)
        .await
        .map_err(into_status_error)?;

    Ok(Json(bundle.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::{
        bundles::{MockBundlesService, records::BundleUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::bundles_service;

    use super::{super::tests::make_bundle, *};

    fn make_service(bundles: MockBundlesService) -> Service {
        bundles_service(
            bundles,
            Router::with_path("bundles/{bundle}/products")
                .post(add)
                .delete(remove),
        )
    }

    #[tokio::test]
    async fn test_add_products_forwards_members() -> TestResult {
        let uuid = BundleUuid::new();
        let product = ProductUuid::new();
        let bundle = make_bundle(uuid, &[product]);

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_add_products()
            .once()
            .withf(move |u, members| {
                *u == uuid && members.iter().map(|m| m.product_uuid).eq([product])
            })
            .return_once(move |_, _| Ok(bundle));

        let res = TestClient::post(format!("http://example.com/bundles/{uuid}/products"))
            .json(&json!({ "products": [{ "product_uuid": product.into_uuid() }] }))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_removing_last_product_returns_inactive_bundle() -> TestResult {
        let uuid = BundleUuid::new();
        let product = ProductUuid::new();
        let bundle = make_bundle(uuid, &[]);

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_remove_products()
            .once()
            .withf(move |u, products| *u == uuid && *products == [product])
            .return_once(move |_, _| Ok(bundle));

        let response: BundleResponse =
            TestClient::delete(format!("http://example.com/bundles/{uuid}/products"))
                .json(&json!({ "products": [product.into_uuid()] }))
                .send(&make_service(bundles))
                .await
                .take_json()
                .await?;

        assert!(!response.is_active);
        assert!(response.products.is_empty());
        assert_eq!(response.mrp, rust_decimal::Decimal::new(3000, 0));

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_quantity_returns_400() -> TestResult {
        let mut bundles = MockBundlesService::new();

        bundles.expect_add_products().never();

        let res = TestClient::post(format!(
            "http://example.com/bundles/{}/products",
            BundleUuid::new()
        ))
        .json(&json!({ "products": [{ "product_uuid": Uuid::now_v7(), "quantity": 0 }] }))
        .send(&make_service(bundles))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
