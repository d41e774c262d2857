//! Update Category Handler

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

use bazaar_app::domain::categories::data::CategoryUpdate;

use crate::{
    categories::{errors::into_status_error, models::CategoryResponse},
    extensions::*,
    state::State,
};

/// Update Category Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<UpdateCategoryRequest> for CategoryUpdate {
    fn from(request: UpdateCategoryRequest) -> Self {
        CategoryUpdate {
            name: request.name.trim().to_string(),
            description: request.description,
        }
    }
}

/// Update Category Handler
#[endpoint(
    tags("categories"),
    summary = "Update Category",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Category updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Category not found"),
        (status_code = StatusCode::CONFLICT, description = "Name already taken"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    category: PathParam<Uuid>,
    json: JsonBody<UpdateCategoryRequest>,
    depot: &mut Depot,
) -> Result<Json<CategoryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    if request.name.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Category name is required"));
    }

    let category = state
        .app
        .categories
        .update_category(category.into_inner().into(), request.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(category.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::categories::{
        CategoriesServiceError, MockCategoriesService, records::CategoryUuid,
    };

    use crate::test_helpers::categories_service;

    use super::{super::tests::make_category, *};

    fn make_service(categories: MockCategoriesService) -> Service {
        categories_service(
            categories,
            Router::with_path("categories/{category}").put(handler),
        )
    }

    #[tokio::test]
    async fn test_update_category_success() -> TestResult {
        let uuid = CategoryUuid::new();
        let category = make_category(uuid, "Outdoor");

        let mut categories = MockCategoriesService::new();

        categories
            .expect_update_category()
            .once()
            .withf(move |u, update| *u == uuid && update.name == "Outdoor")
            .return_once(move |_, _| Ok(category));

        let response: CategoryResponse =
            TestClient::put(format!("http://example.com/categories/{uuid}"))
                .json(&json!({ "name": "Outdoor" }))
                .send(&make_service(categories))
                .await
                .take_json()
                .await?;

        assert_eq!(response.name, "Outdoor");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_name_clash_returns_409() -> TestResult {
        let mut categories = MockCategoriesService::new();

        categories
            .expect_update_category()
            .once()
            .return_once(|_, _| Err(CategoriesServiceError::AlreadyExists));

        let res = TestClient::put(format!(
            "http://example.com/categories/{}",
            CategoryUuid::new()
        ))
        .json(&json!({ "name": "Kitchen" }))
        .send(&make_service(categories))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
