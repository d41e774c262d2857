//! Delete Bundle Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{bundles::errors::into_status_error, extensions::*, state::State};

/// Delete Bundle Handler
///
/// Reverses the bundle's admin layer, drops its sale enrollments and
/// soft-deletes it.
#[endpoint(
    tags("bundles"),
    summary = "Delete Bundle",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Bundle deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Bundle not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    bundle: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .bundles
        .delete_bundle(bundle.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use bazaar_app::domain::bundles::{BundlesServiceError, MockBundlesService, records::BundleUuid};

    use crate::test_helpers::bundles_service;

    use super::*;

    fn make_service(bundles: MockBundlesService) -> Service {
        bundles_service(bundles, Router::with_path("bundles/{bundle}").delete(handler))
    }

    #[tokio::test]
    async fn test_delete_bundle_success() -> TestResult {
        let uuid = BundleUuid::new();

        let mut bundles = MockBundlesService::new();

        bundles
            .expect_delete_bundle()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(|_| Ok(()));

        let res = TestClient::delete(format!("http://example.com/bundles/{uuid}"))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_twice_returns_404() -> TestResult {
        let mut bundles = MockBundlesService::new();

        bundles
            .expect_delete_bundle()
            .once()
            .return_once(|_| Err(BundlesServiceError::NotFound));

        let res = TestClient::delete(format!("http://example.com/bundles/{}", BundleUuid::new()))
            .send(&make_service(bundles))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
