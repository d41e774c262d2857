//! Sale Product Membership Handlers

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    pricing::batch_parts,
    sales::{
        errors::into_status_error,
        models::{MembershipBatchResponse, SaleProductsRequest},
    },
    state::State,
};

/// Enroll Sale Products Handler
///
/// Each product must belong to one of the sale's categories. While the sale
/// is active the category percentage is layered immediately and every bundle
/// containing the product follows; for a future sale pricing waits until it
/// starts.
#[endpoint(
    tags("sales"),
    summary = "Enroll Sale Products",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-product results"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::CONFLICT, description = "Sale has ended"),
    ),
)]
#[tracing::instrument(
    name = "sales.enroll_products",
    skip(sale, at, json, depot),
    fields(sale_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn enroll(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    json: JsonBody<SaleProductsRequest>,
    depot: &mut Depot,
) -> Result<Json<MembershipBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let sale = sale.into_inner();

    tracing::Span::current().record("sale_uuid", tracing::field::display(sale));

    let products = json.into_inner().products.into_iter().map(Into::into).collect();

    let outcome = state
        .app
        .sales
        .enroll_products(sale.into(), products, now)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("sale_enroll_products", outcome);

    Ok(Json(MembershipBatchResponse { results, errors }))
}

/// Withdraw Sale Products Handler
///
/// Reverses the sale layer on each product. Automatically enrolled bundles
/// left without enrolled members are withdrawn too.
#[endpoint(
    tags("sales"),
    summary = "Withdraw Sale Products",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Per-product results"),
        (status_code = StatusCode::NOT_FOUND, description = "Sale not found"),
        (status_code = StatusCode::CONFLICT, description = "Sale has ended"),
    ),
)]
#[tracing::instrument(
    name = "sales.withdraw_products",
    skip(sale, at, json, depot),
    fields(sale_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn withdraw(
    sale: PathParam<Uuid>,
    at: QueryParam<String, false>,
    json: JsonBody<SaleProductsRequest>,
    depot: &mut Depot,
) -> Result<Json<MembershipBatchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let sale = sale.into_inner();

    tracing::Span::current().record("sale_uuid", tracing::field::display(sale));

    let products = json.into_inner().products.into_iter().map(Into::into).collect();

    let outcome = state
        .app
        .sales
        .withdraw_products(sale.into(), products, now)
        .await
        .map_err(into_status_error)?;

    let (results, errors) = batch_parts("sale_withdraw_products", outcome);

    Ok(Json(MembershipBatchResponse { results, errors }))
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::{batch::BatchOutcome, error::PricingError};
    use rust_decimal::Decimal;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::{
        bundles::records::BundleUuid,
        pricing::records::{EntityRef, RepricedEntity},
        products::records::ProductUuid,
        sales::{
            MockSalesService, SalesServiceError,
            records::{MembershipChange, SaleUuid},
        },
    };

    use crate::test_helpers::sales_service;

    use super::*;

    fn make_service(sales: MockSalesService) -> Service {
        sales_service(
            sales,
            Router::with_path("sales/{sale}/products")
                .post(enroll)
                .delete(withdraw),
        )
    }

    #[tokio::test]
    async fn test_enroll_reports_repricing_and_category_misses() -> TestResult {
        let uuid = SaleUuid::new();
        let in_scope = ProductUuid::new();
        let out_of_scope = ProductUuid::new();
        let bundle = BundleUuid::new();

        let mut sales = MockSalesService::new();

        sales
            .expect_enroll_products()
            .once()
            .withf(move |u, products, _| *u == uuid && *products == [in_scope, out_of_scope])
            .return_once(move |_, _, _| {
                let mut outcome = BatchOutcome::new();

                outcome.results.push(MembershipChange {
                    entity: EntityRef::product(in_scope.into_uuid()),
                    repriced: Some(RepricedEntity {
                        entity: EntityRef::product(in_scope.into_uuid()),
                        selling_price: Decimal::new(70, 0),
                        layer: None,
                    }),
                    bundles: vec![bundle],
                });
                outcome.fail(out_of_scope.into_uuid(), &SalesServiceError::CategoryNotInSale);

                Ok(outcome)
            });

        let body: MembershipBatchResponse =
            TestClient::post(format!("http://example.com/sales/{uuid}/products"))
                .json(&json!({
                    "products": [in_scope.into_uuid(), out_of_scope.into_uuid()],
                }))
                .send(&make_service(sales))
                .await
                .take_json()
                .await?;

        let change = body.results.first();

        assert_eq!(
            change.and_then(|c| c.repriced.as_ref()).map(|r| r.selling_price),
            Some(Decimal::new(70, 0))
        );
        assert_eq!(
            change.map(|c| c.bundles.clone()),
            Some(vec![bundle.into_uuid()])
        );
        assert_eq!(
            body.errors.first().map(|e| (e.uuid, e.kind.as_str())),
            Some((out_of_scope.into_uuid(), "category_not_in_sale"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_enroll_in_ended_sale_returns_409() -> TestResult {
        let mut sales = MockSalesService::new();

        sales
            .expect_enroll_products()
            .once()
            .return_once(|_, _, _| Err(SalesServiceError::Pricing(PricingError::SaleEnded)));

        let res = TestClient::post(format!(
            "http://example.com/sales/{}/products",
            SaleUuid::new()
        ))
        .json(&json!({ "products": [ProductUuid::new().into_uuid()] }))
        .send(&make_service(sales))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_withdraw_forwards_point_in_time() -> TestResult {
        let uuid = SaleUuid::new();
        let product = ProductUuid::new();
        let at: jiff::Timestamp = "2026-06-10T08:00:00Z".parse()?;

        let mut sales = MockSalesService::new();

        sales
            .expect_withdraw_products()
            .once()
            .withf(move |u, products, now| *u == uuid && *products == [product] && *now == at)
            .return_once(move |_, _, _| {
                let mut outcome = BatchOutcome::new();

                outcome
                    .results
                    .push(MembershipChange::unchanged(EntityRef::product(
                        product.into_uuid(),
                    )));

                Ok(outcome)
            });

        let body: MembershipBatchResponse = TestClient::delete(format!(
            "http://example.com/sales/{uuid}/products?at=2026-06-10T08:00:00Z"
        ))
        .json(&json!({ "products": [product.into_uuid()] }))
        .send(&make_service(sales))
        .await
        .take_json()
        .await?;

        assert_eq!(body.results.first().map(|c| c.kind.as_str()), Some("product"));
        assert!(body.results.iter().all(|c| c.repriced.is_none()));

        Ok(())
    }
}
