//! Update Bundle Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::bundles::data::BundleUpdate;

use crate::{
    bundles::{errors::into_status_error, models::BundleResponse},
    extensions::*,
    state::State,
};

/// Update Bundle Request
///
/// Absent fields are left unchanged.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateBundleRequest {
    pub name: Option<String>,
    /// Bundle discount percentage, 0 to 100
    pub discount: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl From<UpdateBundleRequest> for BundleUpdate {
    fn from(request: UpdateBundleRequest) -> Self {
        BundleUpdate {
            name: request.name.map(|name| name.trim().to_string()),
            discount: request.discount,
            is_active: request.is_active,
        }
    }
}

/// Update Bundle Handler
///
/// Recomputes the selling price, re-applying any admin layer.
#[endpoint(
    tags("bundles"),
    summary = "Update Bundle",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Bundle updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Bundle not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Price would become invalid"),
    ),
)]
pub(crate) async fn handler(
    bundle: PathParam<Uuid>,
    json: JsonBody<UpdateBundleRequest>,
    depot: &mut Depot,
) -> Result<Json<BundleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    if request.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(StatusError::bad_request().brief("Bundle name must not be blank"));
    }

    let bundle = state
        .app
        .bundles
        .update_bundle(bundle.into_inner().into(), request.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(bundle.into()))
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::error::PricingError;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::{
        bundles::{BundlesServiceError, MockBundlesService, records::BundleUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::bundles_service;

    use super::{super::tests::make_bundle, *};

    fn make_service(bundles: MockBundlesService) -> Service {
        bundles_service(bundles, Router::with_path("bundles/{bundle}").put(handler))
    }

    #[tokio::test]
    async fn test_update_forwards_only_present_fields() -> TestResult {
        let uuid = BundleUuid::new();
        let bundle = make_bundle(uuid, &[ProductUuid::new()]);

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_update_bundle()
            .once()
            .withf(move |u, update| {
                *u == uuid
                    && *update
                        == BundleUpdate {
                            name: None,
                            discount: Some(Decimal::new(15, 0)),
                            is_active: None,
                        }
            })
            .return_once(move |_, _| Ok(bundle));

        let response: BundleResponse = TestClient::put(format!("http://example.com/bundles/{uuid}"))
            .json(&json!({ "discount": 15 }))
            .send(&make_service(bundles))
            .await
            .take_json()
            .await?;

        assert_eq!(response.uuid, uuid.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_negative_price_returns_422() -> TestResult {
        let mut bundles = MockBundlesService::new();

        bundles.expect_update_bundle().once().return_once(|_, _| {
            Err(BundlesServiceError::Pricing(PricingError::NegativePrice(
                Decimal::NEGATIVE_ONE,
            )))
        });

        let res = TestClient::put(format!("http://example.com/bundles/{}", BundleUuid::new()))
            .json(&json!({ "discount": 15 }))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
