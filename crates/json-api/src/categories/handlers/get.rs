//! Get Category Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    categories::{errors::into_status_error, models::CategoryResponse},
    extensions::*,
    state::State,
};

/// Get Category Handler
#[endpoint(
    tags("categories"),
    summary = "Get Category",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Category found"),
        (status_code = StatusCode::NOT_FOUND, description = "Category not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid category id"),
    ),
)]
pub(crate) async fn handler(
    category: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CategoryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let category = state
        .app
        .categories
        .get_category(category.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(category.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::categories::{
        CategoriesServiceError, MockCategoriesService, records::CategoryUuid,
    };

    use crate::test_helpers::categories_service;

    use super::{super::tests::make_category, *};

    fn make_service(categories: MockCategoriesService) -> Service {
        categories_service(
            categories,
            Router::with_path("categories/{category}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_get_returns_category() -> TestResult {
        let uuid = CategoryUuid::new();
        let category = make_category(uuid, "Garden");

        let mut categories = MockCategoriesService::new();

        categories
            .expect_get_category()
            .once()
            .withf(move |u| *u == uuid)
            .return_once(move |_| Ok(category));

        let response: CategoryResponse =
            TestClient::get(format!("http://example.com/categories/{uuid}"))
                .send(&make_service(categories))
                .await
                .take_json()
                .await?;

        assert_eq!(response.uuid, uuid.into_uuid());
        assert_eq!(response.name, "Garden");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_category_returns_404() -> TestResult {
        let mut categories = MockCategoriesService::new();

        categories
            .expect_get_category()
            .once()
            .return_once(|_| Err(CategoriesServiceError::NotFound));

        let res = TestClient::get(format!(
            "http://example.com/categories/{}",
            CategoryUuid::new()
        ))
        .send(&make_service(categories))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_invalid_uuid_returns_400() -> TestResult {
        let res = TestClient::get("http://example.com/categories/not-a-uuid")
            .send(&make_service(MockCategoriesService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
