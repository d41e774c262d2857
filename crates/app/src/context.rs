//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        bundles::{BundlesService, PgBundlesService},
        categories::{CategoriesService, PgCategoriesService},
        discounts::{DiscountsService, PgDiscountsService},
        products::{PgProductsService, ProductsService},
        sales::{PgSalesService, SalesService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<dyn AuthService>,
    pub categories: Arc<dyn CategoriesService>,
    pub products: Arc<dyn ProductsService>,
    pub bundles: Arc<dyn BundlesService>,
    pub discounts: Arc<dyn DiscountsService>,
    pub sales: Arc<dyn SalesService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_db(Db::new(pool)))
    }

    /// Build application context over an existing pool.
    #[must_use]
    pub fn from_db(db: Db) -> Self {
        Self {
            auth: Arc::new(PgAuthService::new(db.pool().clone())),
            categories: Arc::new(PgCategoriesService::new(db.clone())),
            products: Arc::new(PgProductsService::new(db.clone())),
            bundles: Arc::new(PgBundlesService::new(db.clone())),
            discounts: Arc::new(PgDiscountsService::new(db.clone())),
            sales: Arc::new(PgSalesService::new(db)),
        }
    }
}
