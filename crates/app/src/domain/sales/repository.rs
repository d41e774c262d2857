//! Sales Repository

use bazaar_pricing::{state::Availability, window::DateWindow};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
};
use uuid::Uuid;

use crate::{
    auth::decode_principal_columns,
    database::RowLock,
    domain::{
        bundles::records::BundleUuid,
        categories::records::CategoryUuid,
        pagination::{Counted, ListParams, Page},
        pricing::records::{EntityRef, decode_percent},
        products::records::ProductUuid,
        sales::{
            data::NewSale,
            records::{BundleOrigin, SaleBundle, SaleCategory, SaleRecord, SaleSort, SaleUuid},
        },
    },
};

const LIST_SALES_SQL: &str = include_str!("sql/list_sales.sql");
const GET_SALE_SQL: &str = include_str!("sql/get_sale.sql");
const SHARE_SALE_SQL: &str = include_str!("sql/share_sale.sql");
const LOCK_SALE_SQL: &str = include_str!("sql/lock_sale.sql");
const CREATE_SALE_SQL: &str = include_str!("sql/create_sale.sql");
const INSERT_SALE_CATEGORIES_SQL: &str = include_str!("sql/insert_sale_categories.sql");
const LIST_SALE_CATEGORIES_SQL: &str = include_str!("sql/list_sale_categories.sql");
const LIST_SALE_PRODUCTS_SQL: &str = include_str!("sql/list_sale_products.sql");
const LIST_SALE_BUNDLES_SQL: &str = include_str!("sql/list_sale_bundles.sql");
const DELETE_SALE_SQL: &str = include_str!("sql/delete_sale.sql");
const CLEAR_SALE_PRODUCTS_SQL: &str = include_str!("sql/clear_sale_products.sql");
const CLEAR_SALE_BUNDLES_SQL: &str = include_str!("sql/clear_sale_bundles.sql");
const FIND_PRODUCT_MEMBER_SQL: &str = include_str!("sql/find_product_member.sql");
const ENROLL_PRODUCT_SQL: &str = include_str!("sql/enroll_product.sql");
const WITHDRAW_PRODUCT_SQL: &str = include_str!("sql/withdraw_product.sql");
const LIST_BUNDLES_CONTAINING_SQL: &str = include_str!("sql/list_bundles_containing.sql");
const FIND_BUNDLE_ORIGIN_SQL: &str = include_str!("sql/find_bundle_origin.sql");
const LIST_BUNDLE_MEMBER_CATEGORIES_SQL: &str =
    include_str!("sql/list_bundle_member_categories.sql");
const ENROLL_BUNDLE_SQL: &str = include_str!("sql/enroll_bundle.sql");
const WITHDRAW_BUNDLE_SQL: &str = include_str!("sql/withdraw_bundle.sql");
const LIST_UNPRICED_MEMBERS_SQL: &str = include_str!("sql/list_unpriced_members.sql");
const LIST_BUNDLE_SALES_SQL: &str = include_str!("sql/list_bundle_sales.sql");

/// A product as seen by sale membership.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProductMember {
    pub category_uuid: CategoryUuid,
    pub availability: Availability,
    pub is_enrolled: bool,
}

/// Category of one bundle member and whether that member is enrolled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberCategory {
    pub category_uuid: Uuid,
    pub is_enrolled: bool,
}

#[derive(Debug)]
struct SaleCategoryRow {
    sale_uuid: SaleUuid,
    category: SaleCategory,
}

#[derive(Debug)]
struct SaleBundleRow {
    sale_uuid: SaleUuid,
    bundle: SaleBundle,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSalesRepository;

impl PgSalesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_sales(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        params: &ListParams<SaleSort>,
    ) -> Result<Page<SaleRecord>, sqlx::Error> {
        let sql = params.render(LIST_SALES_SQL);

        let rows = query_as::<Postgres, Counted<SaleRecord>>(&sql)
            .bind(params.search_pattern())
            .bind(i64::from(params.limit()))
            .bind(params.offset())
            .fetch_all(&mut **tx)
            .await?;

        let mut page = Page::from_counted(rows, params);

        self.attach_members(tx, &mut page.items).await?;

        Ok(page)
    }

    pub(crate) async fn get_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
    ) -> Result<SaleRecord, sqlx::Error> {
        let record = query_as::<Postgres, SaleRecord>(GET_SALE_SQL)
            .bind(sale.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        let mut records = [record];

        self.attach_members(tx, &mut records).await?;

        let [record] = records;

        Ok(record)
    }

    /// Lock a live sale. Only categories are loaded.
    pub(crate) async fn lock_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        lock: RowLock,
    ) -> Result<SaleRecord, sqlx::Error> {
        let sql = match lock {
            RowLock::Share => SHARE_SALE_SQL,
            RowLock::Update => LOCK_SALE_SQL,
        };

        let mut record = query_as::<Postgres, SaleRecord>(sql)
            .bind(sale.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        record.categories = self
            .categories_of(tx, &[sale.into_uuid()])
            .await?
            .into_iter()
            .map(|row| row.category)
            .collect();

        Ok(record)
    }

    pub(crate) async fn create_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: &NewSale,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_SALE_SQL)
            .bind(sale.uuid.into_uuid())
            .bind(&sale.name)
            .bind(sale.description.as_deref())
            .bind(SqlxTimestamp::from(sale.start_date))
            .bind(SqlxTimestamp::from(sale.end_date))
            .bind(sale.created_by.uuid)
            .bind(sale.created_by.role.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Attach categories to a sale, skipping any that are missing or deleted.
    /// Returns the number attached.
    pub(crate) async fn insert_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        categories: &[(CategoryUuid, Decimal)],
    ) -> Result<u64, sqlx::Error> {
        let (uuids, discounts): (Vec<Uuid>, Vec<Decimal>) = categories
            .iter()
            .map(|(category, discount)| (category.into_uuid(), *discount))
            .unzip();

        let rows_affected = query(INSERT_SALE_CATEGORIES_SQL)
            .bind(sale.into_uuid())
            .bind(uuids)
            .bind(discounts)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_SALE_SQL)
            .bind(sale.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Drop every product and bundle enrollment of a sale.
    pub(crate) async fn clear_enrollments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
    ) -> Result<(), sqlx::Error> {
        for sql in [CLEAR_SALE_PRODUCTS_SQL, CLEAR_SALE_BUNDLES_SQL] {
            query(sql).bind(sale.into_uuid()).execute(&mut **tx).await?;
        }

        Ok(())
    }

    pub(crate) async fn product_member(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        product: ProductUuid,
    ) -> Result<ProductMember, sqlx::Error> {
        query_as::<Postgres, ProductMember>(FIND_PRODUCT_MEMBER_SQL)
            .bind(sale.into_uuid())
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn enroll_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        product: ProductUuid,
    ) -> Result<(), sqlx::Error> {
        query(ENROLL_PRODUCT_SQL)
            .bind(sale.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn withdraw_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(WITHDRAW_PRODUCT_SQL)
            .bind(sale.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Live bundles that list `product` as a member.
    pub(crate) async fn bundles_containing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<BundleUuid>, sqlx::Error> {
        let uuids: Vec<Uuid> = query_scalar(LIST_BUNDLES_CONTAINING_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(BundleUuid::from_uuid).collect())
    }

    /// Live sales that enroll `bundle` or any of its members.
    pub(crate) async fn sales_touching_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<Vec<SaleUuid>, sqlx::Error> {
        let uuids: Vec<Uuid> = query_scalar(LIST_BUNDLE_SALES_SQL)
            .bind(bundle.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(SaleUuid::from_uuid).collect())
    }

    pub(crate) async fn bundle_origin(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        bundle: BundleUuid,
    ) -> Result<Option<BundleOrigin>, sqlx::Error> {
        let origin: Option<String> = query_scalar(FIND_BUNDLE_ORIGIN_SQL)
            .bind(sale.into_uuid())
            .bind(bundle.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        origin
            .map(|origin| origin.parse::<BundleOrigin>())
            .transpose()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "origin".to_string(),
                source: Box::new(error),
            })
    }

    pub(crate) async fn bundle_member_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        bundle: BundleUuid,
    ) -> Result<Vec<MemberCategory>, sqlx::Error> {
        query_as::<Postgres, MemberCategory>(LIST_BUNDLE_MEMBER_CATEGORIES_SQL)
            .bind(sale.into_uuid())
            .bind(bundle.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn enroll_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        bundle: BundleUuid,
        origin: BundleOrigin,
    ) -> Result<(), sqlx::Error> {
        query(ENROLL_BUNDLE_SQL)
            .bind(sale.into_uuid())
            .bind(bundle.into_uuid())
            .bind(origin.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn withdraw_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
        bundle: BundleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(WITHDRAW_BUNDLE_SQL)
            .bind(sale.into_uuid())
            .bind(bundle.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Enrolled products and bundles that do not yet carry this sale's layer.
    pub(crate) async fn unpriced_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: SaleUuid,
    ) -> Result<Vec<EntityRef>, sqlx::Error> {
        query_as::<Postgres, EntityRef>(LIST_UNPRICED_MEMBERS_SQL)
            .bind(sale.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    async fn categories_of(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sales: &[Uuid],
    ) -> Result<Vec<SaleCategoryRow>, sqlx::Error> {
        query_as::<Postgres, SaleCategoryRow>(LIST_SALE_CATEGORIES_SQL)
            .bind(sales)
            .fetch_all(&mut **tx)
            .await
    }

    /// Fill categories, enrolled products and enrolled bundles.
    async fn attach_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        records: &mut [SaleRecord],
    ) -> Result<(), sqlx::Error> {
        if records.is_empty() {
            return Ok(());
        }

        let uuids: Vec<Uuid> = records.iter().map(|record| record.uuid.into_uuid()).collect();

        let mut categories: FxHashMap<SaleUuid, Vec<SaleCategory>> = FxHashMap::default();

        for row in self.categories_of(tx, &uuids).await? {
            categories.entry(row.sale_uuid).or_default().push(row.category);
        }

        let product_rows = query_as::<Postgres, (Uuid, Uuid)>(LIST_SALE_PRODUCTS_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut products: FxHashMap<SaleUuid, Vec<ProductUuid>> = FxHashMap::default();

        for (sale, product) in product_rows {
            products
                .entry(SaleUuid::from_uuid(sale))
                .or_default()
                .push(ProductUuid::from_uuid(product));
        }

        let bundle_rows = query_as::<Postgres, SaleBundleRow>(LIST_SALE_BUNDLES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut bundles: FxHashMap<SaleUuid, Vec<SaleBundle>> = FxHashMap::default();

        for row in bundle_rows {
            bundles.entry(row.sale_uuid).or_default().push(row.bundle);
        }

        for record in records {
            record.categories = categories.remove(&record.uuid).unwrap_or_default();
            record.products = products.remove(&record.uuid).unwrap_or_default();
            record.bundles = bundles.remove(&record.uuid).unwrap_or_default();
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for SaleRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let start: SqlxTimestamp = row.try_get("start_date")?;
        let end: SqlxTimestamp = row.try_get("end_date")?;

        Ok(Self {
            uuid: SaleUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            window: DateWindow::new(start.to_jiff(), end.to_jiff()).map_err(|error| {
                sqlx::Error::ColumnDecode {
                    index: "end_date".to_string(),
                    source: Box::new(error),
                }
            })?,
            categories: Vec::new(),
            products: Vec::new(),
            bundles: Vec::new(),
            created_by: decode_principal_columns(row, "created_by_uuid", "created_by_role")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for SaleCategoryRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            sale_uuid: SaleUuid::from_uuid(row.try_get("sale_uuid")?),
            category: SaleCategory {
                category_uuid: CategoryUuid::from_uuid(row.try_get("category_uuid")?),
                discount: decode_percent(row, "discount")?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for SaleBundleRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let origin: String = row.try_get("origin")?;

        Ok(Self {
            sale_uuid: SaleUuid::from_uuid(row.try_get("sale_uuid")?),
            bundle: SaleBundle {
                bundle_uuid: BundleUuid::from_uuid(row.try_get("bundle_uuid")?),
                origin: origin
                    .parse()
                    .map_err(|error| sqlx::Error::ColumnDecode {
                        index: "origin".to_string(),
                        source: Box::new(error),
                    })?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ProductMember {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            category_uuid: CategoryUuid::from_uuid(row.try_get("category_uuid")?),
            availability: Availability {
                is_active: row.try_get("is_active")?,
                is_blocked: row.try_get("is_blocked")?,
                is_deleted: row.try_get("is_deleted")?,
            },
            is_enrolled: row.try_get("is_enrolled")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for MemberCategory {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            category_uuid: row.try_get("category_uuid")?,
            is_enrolled: row.try_get("is_enrolled")?,
        })
    }
}
