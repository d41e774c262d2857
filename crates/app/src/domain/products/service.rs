//! Products service.

use async_trait::async_trait;
use bazaar_pricing::{engine, percent::Percent};
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        pagination::{ListParams, Page},
        products::{
            data::{NewProduct, ProductFilter},
            errors::ProductsServiceError,
            records::{ProductRecord, ProductSort, ProductUuid},
            repository::PgProductsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }

    async fn set_blocked(
        &self,
        product: ProductUuid,
        blocked: bool,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .repository
            .set_blocked(&mut tx, product, blocked)
            .await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        let record = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        info!(product_uuid = %product, blocked, "changed product moderation");

        Ok(record)
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn list_products(
        &self,
        params: ListParams<ProductSort>,
        filter: ProductFilter,
    ) -> Result<Page<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let page = self
            .repository
            .list_products(&mut tx, &params, filter)
            .await?;

        tx.commit().await?;

        Ok(page)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, product),
        fields(
            product_uuid = %product.uuid,
            category_uuid = %product.category_uuid,
            selling_price = tracing::field::Empty
        ),
        err
    )]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if product.name.trim().is_empty() {
            return Err(ProductsServiceError::MissingRequiredData);
        }

        if product.mrp < Decimal::ZERO {
            return Err(ProductsServiceError::InvalidData);
        }

        let discount = Percent::new(product.discount)?;
        let selling_price = engine::base_selling_price(product.mrp, discount)?;

        Span::current().record("selling_price", tracing::field::display(selling_price));

        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_product(&mut tx, &product, selling_price)
            .await?
            .ok_or(ProductsServiceError::InvalidReference)?;

        let record = self.repository.get_product(&mut tx, created).await?;

        tx.commit().await?;

        info!(product_uuid = %record.uuid, "created product");

        Ok(record)
    }

    #[tracing::instrument(
        name = "products.service.block_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn block_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        self.set_blocked(product, true).await
    }

    #[tracing::instrument(
        name = "products.service.unblock_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn unblock_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        self.set_blocked(product, false).await
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a page of products.
    async fn list_products(
        &self,
        params: ListParams<ProductSort>,
        filter: ProductFilter,
    ) -> Result<Page<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single product with its admin layer.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;

    /// Create a product priced from its list price and seller discount.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Block a product from sale and from new pricing layers.
    async fn block_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Lift a block.
    async fn unblock_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;
}
