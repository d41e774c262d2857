//! Get Bundle Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    bundles::{errors::into_status_error, models::BundleResponse},
    extensions::*,
    state::State,
};

/// Get Bundle Handler
#[endpoint(
    tags("bundles"),
    summary = "Get Bundle",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Bundle found"),
        (status_code = StatusCode::NOT_FOUND, description = "Bundle not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid bundle id"),
    ),
)]
pub(crate) async fn handler(
    bundle: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BundleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let bundle = state
        .app
        .bundles
        .get_bundle(bundle.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(bundle.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use bazaar_app::domain::bundles::{BundlesServiceError, MockBundlesService, records::BundleUuid};

    use crate::test_helpers::bundles_service;

    use super::*;

    #[tokio::test]
    async fn test_get_missing_bundle_returns_404() -> TestResult {
        let uuid = BundleUuid::new();

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_get_bundle()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(|_| Err(BundlesServiceError::NotFound));

        let service = bundles_service(bundles, Router::with_path("bundles/{bundle}").get(handler));

        let res = TestClient::get(format!("http://example.com/bundles/{uuid}"))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
