//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    categories::records::CategoryUuid,
    pagination::{Counted, ListParams, Page},
    pricing::records::{decode_layer, decode_percent},
    products::{
        data::{NewProduct, ProductFilter},
        records::{ProductRecord, ProductSort, ProductUuid},
    },
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const SET_PRODUCT_BLOCKED_SQL: &str = include_str!("sql/set_product_blocked.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        params: &ListParams<ProductSort>,
        filter: ProductFilter,
    ) -> Result<Page<ProductRecord>, sqlx::Error> {
        let sql = params.render(LIST_PRODUCTS_SQL);

        let rows = query_as::<Postgres, Counted<ProductRecord>>(&sql)
            .bind(filter.category.map(CategoryUuid::into_uuid))
            .bind(params.search_pattern())
            .bind(i64::from(params.limit()))
            .bind(params.offset())
            .fetch_all(&mut **tx)
            .await?;

        Ok(Page::from_counted(rows, params))
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert a product under a live category. Returns `None` when the category
    /// is missing or deleted.
    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
        selling_price: Decimal,
    ) -> Result<Option<ProductUuid>, sqlx::Error> {
        let created: Option<Uuid> = query_scalar(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.category_uuid.into_uuid())
            .bind(&product.name)
            .bind(product.mrp)
            .bind(selling_price)
            .bind(product.discount)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(created.map(ProductUuid::from_uuid))
    }

    pub(crate) async fn set_blocked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        blocked: bool,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_PRODUCT_BLOCKED_SQL)
            .bind(product.into_uuid())
            .bind(blocked)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            category_uuid: CategoryUuid::from_uuid(row.try_get("category_uuid")?),
            name: row.try_get("name")?,
            mrp: row.try_get("mrp")?,
            selling_price: row.try_get("selling_price")?,
            discount: decode_percent(row, "discount")?,
            is_active: row.try_get("is_active")?,
            is_blocked: row.try_get("is_blocked")?,
            adjustment: decode_layer(row)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
