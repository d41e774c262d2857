//! Create Discount Handler

use std::sync::Arc;

use bazaar_pricing::state::PriceBase;
use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::discounts::data::NewDiscount;

use crate::{
    discounts::{errors::into_status_error, models::DiscountResponse},
    extensions::*,
    state::State,
};

/// Create Discount Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateDiscountRequest {
    /// Client supplied identifier; generated when absent
    pub uuid: Option<Uuid>,
    /// Unique discount code
    pub code: String,
    /// RFC 3339 start of the active window
    pub start_date: String,
    /// RFC 3339 end of the active window, inclusive
    pub end_date: String,
    /// Percentage taken off
    pub discount: Decimal,
    /// `MRP` or `sellingPrice`
    pub kind: String,
}

/// Create Discount Handler
///
/// A `sellingPrice` discount must stay below 100 percent so that it can be
/// reversed.
#[endpoint(
    tags("discounts"),
    summary = "Create Discount",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Discount created"),
        (status_code = StatusCode::CONFLICT, description = "Discount code already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Discount value cannot be reversed"),
    ),
)]
#[tracing::instrument(
    name = "discounts.create",
    skip(json, depot, res),
    fields(discount_code = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateDiscountRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<DiscountResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();
    let code = request.code.trim().to_string();

    tracing::Span::current().record("discount_code", code.as_str());

    if code.is_empty() {
        return Err(StatusError::bad_request().brief("Discount code is required"));
    }

    let kind = request
        .kind
        .parse::<PriceBase>()
        .or_400("kind must be \"MRP\" or \"sellingPrice\"")?;

    let discount = state
        .app
        .discounts
        .create_discount(NewDiscount {
            uuid: request.uuid.unwrap_or_else(Uuid::now_v7).into(),
            code,
            start_date: parse_timestamp(&request.start_date, "start_date")?,
            end_date: parse_timestamp(&request.end_date, "end_date")?,
            discount: request.discount,
            kind,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/discounts/{}", discount.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(discount.into()))
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::error::PricingError;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bazaar_app::domain::discounts::{
        DiscountsServiceError, MockDiscountsService, records::DiscountUuid,
    };

    use crate::test_helpers::discounts_service;

    use super::{super::tests::make_discount, *};

    fn make_service(discounts: MockDiscountsService) -> Service {
        discounts_service(discounts, Router::with_path("discounts").post(handler))
    }

    fn request_body(kind: &str, discount: u32) -> Value {
        json!({
            "code": " WINTER20 ",
            "start_date": "2026-01-01T00:00:00Z",
            "end_date": "2026-12-31T23:59:59Z",
            "discount": discount,
            "kind": kind,
        })
    }

    #[tokio::test]
    async fn test_create_discount_success() -> TestResult {
        let uuid = DiscountUuid::new();
        let discount = make_discount(uuid, PriceBase::Mrp)?;

        let mut discounts = MockDiscountsService::new();

        discounts
            .expect_create_discount()
            .once()
            .withf(|new| {
                new.code == "WINTER20"
                    && new.kind == PriceBase::Mrp
                    && new.discount == Decimal::new(20, 0)
                    && new.start_date < new.end_date
            })
            .return_once(move |_| Ok(discount));

        let mut res = TestClient::post("http://example.com/discounts")
            .json(&request_body("MRP", 20))
            .send(&make_service(discounts))
            .await;

        let body: DiscountResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.uuid, uuid.into_uuid());
        assert_eq!(
            res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some(format!("/discounts/{uuid}").as_str())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_discount_unknown_kind_returns_400() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts.expect_create_discount().never();

        let res = TestClient::post("http://example.com/discounts")
            .json(&request_body("listPrice", 20))
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_discount_malformed_date_returns_400() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts.expect_create_discount().never();

        let body = json!({
            "code": "WINTER20",
            "start_date": "2026-01-01T00:00:00Z",
            "end_date": "someday",
            "discount": 20,
            "kind": "MRP",
        });

        let res = TestClient::post("http://example.com/discounts")
            .json(&body)
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_full_selling_price_discount_returns_422() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts.expect_create_discount().once().return_once(|_| {
            Err(DiscountsServiceError::Pricing(
                PricingError::InvalidDiscountValue,
            ))
        });

        let res = TestClient::post("http://example.com/discounts")
            .json(&request_body("sellingPrice", 100))
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_duplicate_code_returns_409() -> TestResult {
        let mut discounts = MockDiscountsService::new();

        discounts
            .expect_create_discount()
            .once()
            .return_once(|_| Err(DiscountsServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/discounts")
            .json(&request_body("MRP", 20))
            .send(&make_service(discounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
