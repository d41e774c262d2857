//! Delete Sale Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, sales::errors::into_status_error, state::State};

/// Delete Sale Handler
///
/// Reverses every price the sale layered, clears its enrollments and
/// soft-deletes it.
#[endpoint(
    tags("sales"),
    summary = "Delete Sale",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Sale deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    sale: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .sales
        .delete_sale(sale.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use bazaar_app::domain::sales::{MockSalesService, SalesServiceError, records::SaleUuid};

    use crate::test_helpers::sales_service;

    use super::*;

    fn make_service(sales: MockSalesService) -> Service {
        sales_service(sales, Router::with_path("sales/{sale}").delete(handler))
    }

    #[tokio::test]
    async fn test_delete_sale_success() -> TestResult {
        let uuid = SaleUuid::new();

        let mut sales = MockSalesService::new();

        sales
            .expect_delete_sale()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(|_| Ok(()));

        let res = TestClient::delete(format!("http://example.com/sales/{uuid}"))
            .send(&make_service(sales))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_storage_failure_returns_500() -> TestResult {
        let mut sales = MockSalesService::new();

        sales
            .expect_delete_sale()
            .once()
            .return_once(|_| Err(SalesServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::delete(format!("http://example.com/sales/{}", SaleUuid::new()))
            .send(&make_service(sales))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
