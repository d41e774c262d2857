//! Delete Discount Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{discounts::errors::into_status_error, extensions::*, state::State};

/// Delete Discount Handler
///
/// Reverses the discount on every product and bundle it layers, then
/// soft-deletes it.
#[endpoint(
    tags("discounts"),
    summary = "Delete Discount",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Discount deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Discount not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    discount: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .discounts
        .delete_discount(discount.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use bazaar_app::domain::discounts::{
        DiscountsServiceError, MockDiscountsService, records::DiscountUuid,
    };

    use crate::test_helpers::discounts_service;

    use super::*;

    fn make_service(discounts: MockDiscountsService) -> Service {
        discounts_service(
            discounts,
            Router::with_path("discounts/{discount}").delete(handler),
        )
    }

    #[tokio::test]
    async fn test_delete_discount_success() -> TestResult {
        let uuid = DiscountUuid::new();

        let mut discounts = MockDiscountsService::new();

        discounts
            .expect_delete_discount()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(|_| Ok(()));

        let res = TestClient::delete(format!("http://example.com/discounts/{uuid}"))
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_discount_returns_404() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts
            .expect_delete_discount()
            .once()
            .return_once(|_| Err(DiscountsServiceError::NotFound));

        let res = TestClient::delete(format!(
            "http://example.com/discounts/{}",
            DiscountUuid::new()
        ))
        .send(&make_service(discounts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
