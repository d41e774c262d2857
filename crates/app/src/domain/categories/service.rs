//! Categories service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        categories::{
            data::{CategoryUpdate, NewCategory},
            errors::CategoriesServiceError,
            records::{CategoryRecord, CategorySort, CategoryUuid},
            repository::PgCategoriesRepository,
        },
        pagination::{ListParams, Page},
    },
};

#[derive(Debug, Clone)]
pub struct PgCategoriesService {
    db: Db,
    repository: PgCategoriesRepository,
}

impl PgCategoriesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCategoriesRepository::new(),
        }
    }
}

#[async_trait]
impl CategoriesService for PgCategoriesService {
    async fn list_categories(
        &self,
        params: ListParams<CategorySort>,
    ) -> Result<Page<CategoryRecord>, CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let page = self.repository.list_categories(&mut tx, &params).await?;

        tx.commit().await?;

        Ok(page)
    }

    async fn get_category(
        &self,
        category: CategoryUuid,
    ) -> Result<CategoryRecord, CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let category = self.repository.get_category(&mut tx, category).await?;

        tx.commit().await?;

        Ok(category)
    }

    #[tracing::instrument(
        name = "categories.service.create_category",
        skip(self, category),
        fields(category_uuid = %category.uuid),
        err
    )]
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError> {
        if category.name.trim().is_empty() {
            return Err(CategoriesServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_category(&mut tx, &category).await?;

        tx.commit().await?;

        info!(category_uuid = %created.uuid, "created category");

        Ok(created)
    }

    #[tracing::instrument(
        name = "categories.service.update_category",
        skip(self, update),
        fields(category_uuid = %category),
        err
    )]
    async fn update_category(
        &self,
        category: CategoryUuid,
        update: CategoryUpdate,
    ) -> Result<CategoryRecord, CategoriesServiceError> {
        if update.name.trim().is_empty() {
            return Err(CategoriesServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .update_category(&mut tx, category, &update)
            .await?;

        tx.commit().await?;

        info!(category_uuid = %category, "updated category");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "categories.service.delete_category",
        skip(self),
        fields(category_uuid = %category),
        err
    )]
    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_category(&mut tx, category).await?;

        if rows_affected == 0 {
            return Err(CategoriesServiceError::NotFound);
        }

        tx.commit().await?;

        info!(category_uuid = %category, "deleted category");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Retrieve a page of categories.
    async fn list_categories(
        &self,
        params: ListParams<CategorySort>,
    ) -> Result<Page<CategoryRecord>, CategoriesServiceError>;

    /// Retrieve a single category.
    async fn get_category(
        &self,
        category: CategoryUuid,
    ) -> Result<CategoryRecord, CategoriesServiceError>;

    /// Create a category.
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError>;

    /// Rename or re-describe a category.
    async fn update_category(
        &self,
        category: CategoryUuid,
        update: CategoryUpdate,
    ) -> Result<CategoryRecord, CategoriesServiceError>;

    /// Soft-delete a category.
    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CategoriesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::pagination::{ListParams, ListQuery},
        test::TestContext,
    };

    use super::*;

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            uuid: CategoryUuid::new(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn create_category_returns_record() -> TestResult {
        let ctx = TestContext::new().await;
        let category = new_category("Footwear");

        let created = ctx.categories.create_category(category.clone()).await?;

        assert_eq!(created.uuid, category.uuid);
        assert_eq!(created.name, "Footwear");
        assert!(created.deleted_at.is_none());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn duplicate_names_are_rejected_case_insensitively() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.categories
            .create_category(new_category("Footwear"))
            .await?;

        let result = ctx
            .categories
            .create_category(new_category("FOOTWEAR"))
            .await;

        assert!(
            matches!(result, Err(CategoriesServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn list_categories_searches_and_counts() -> TestResult {
        let ctx = TestContext::new().await;

        for name in ["Shoes", "Shirts", "Books"] {
            ctx.categories.create_category(new_category(name)).await?;
        }

        let params = ListParams::try_from(ListQuery {
            search: Some("sh".to_string()),
            sort_field: Some("name".to_string()),
            sort_order: Some("asc".to_string()),
            ..ListQuery::default()
        })?;

        let page = ctx.categories.list_categories(params).await?;
        let names: Vec<&str> = page.items.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(page.total, 2);
        assert_eq!(names, ["Shirts", "Shoes"]);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn update_category_changes_name() -> TestResult {
        let ctx = TestContext::new().await;
        let category = ctx.categories.create_category(new_category("Toys")).await?;

        let updated = ctx
            .categories
            .update_category(
                category.uuid,
                CategoryUpdate {
                    name: "Games".to_string(),
                    description: Some("Board games".to_string()),
                },
            )
            .await?;

        assert_eq!(updated.name, "Games");
        assert_eq!(updated.description.as_deref(), Some("Board games"));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn deleted_category_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let category = ctx.categories.create_category(new_category("Toys")).await?;

        ctx.categories.delete_category(category.uuid).await?;

        let result = ctx.categories.get_category(category.uuid).await;

        assert!(
            matches!(result, Err(CategoriesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let again = ctx.categories.delete_category(category.uuid).await;

        assert!(matches!(again, Err(CategoriesServiceError::NotFound)));

        Ok(())
    }
}
