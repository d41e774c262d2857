//! Discounts Repository

use bazaar_pricing::{state::PriceBase, window::DateWindow};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::RowLock,
    domain::{
        bundles::records::BundleUuid,
        discounts::{
            data::NewDiscount,
            records::{DiscountRecord, DiscountSort, DiscountUuid},
        },
        pagination::{Counted, ListParams, Page},
        pricing::records::{EntityKind, EntityRef, decode_percent},
        products::records::ProductUuid,
    },
};

const LIST_DISCOUNTS_SQL: &str = include_str!("sql/list_discounts.sql");
const GET_DISCOUNT_SQL: &str = include_str!("sql/get_discount.sql");
const SHARE_DISCOUNT_SQL: &str = include_str!("sql/share_discount.sql");
const LOCK_DISCOUNT_SQL: &str = include_str!("sql/lock_discount.sql");
const CREATE_DISCOUNT_SQL: &str = include_str!("sql/create_discount.sql");
const DELETE_DISCOUNT_SQL: &str = include_str!("sql/delete_discount.sql");
const LIST_DISCOUNT_TARGETS_SQL: &str = include_str!("sql/list_discount_targets.sql");

#[derive(Debug)]
struct DiscountTarget {
    discount_uuid: DiscountUuid,
    entity: EntityRef,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDiscountsRepository;

impl PgDiscountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_discounts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        params: &ListParams<DiscountSort>,
    ) -> Result<Page<DiscountRecord>, sqlx::Error> {
        let sql = params.render(LIST_DISCOUNTS_SQL);

        let rows = query_as::<Postgres, Counted<DiscountRecord>>(&sql)
            .bind(params.search_pattern())
            .bind(i64::from(params.limit()))
            .bind(params.offset())
            .fetch_all(&mut **tx)
            .await?;

        let mut page = Page::from_counted(rows, params);

        self.attach_targets(tx, &mut page.items).await?;

        Ok(page)
    }

    pub(crate) async fn get_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: DiscountUuid,
    ) -> Result<DiscountRecord, sqlx::Error> {
        let record = query_as::<Postgres, DiscountRecord>(GET_DISCOUNT_SQL)
            .bind(discount.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        let mut records = [record];

        self.attach_targets(tx, &mut records).await?;

        let [record] = records;

        Ok(record)
    }

    /// Lock a live discount without its targets.
    pub(crate) async fn lock_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: DiscountUuid,
        lock: RowLock,
    ) -> Result<DiscountRecord, sqlx::Error> {
        let sql = match lock {
            RowLock::Share => SHARE_DISCOUNT_SQL,
            RowLock::Update => LOCK_DISCOUNT_SQL,
        };

        query_as::<Postgres, DiscountRecord>(sql)
            .bind(discount.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: &NewDiscount,
    ) -> Result<DiscountRecord, sqlx::Error> {
        query_as::<Postgres, DiscountRecord>(CREATE_DISCOUNT_SQL)
            .bind(discount.uuid.into_uuid())
            .bind(&discount.code)
            .bind(SqlxTimestamp::from(discount.start_date))
            .bind(SqlxTimestamp::from(discount.end_date))
            .bind(discount.discount)
            .bind(discount.kind.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: DiscountUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_DISCOUNT_SQL)
            .bind(discount.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Fill `product_uuids` and `bundle_uuids` from `price_adjustments`.
    async fn attach_targets(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        records: &mut [DiscountRecord],
    ) -> Result<(), sqlx::Error> {
        if records.is_empty() {
            return Ok(());
        }

        let uuids: Vec<Uuid> = records.iter().map(|record| record.uuid.into_uuid()).collect();

        let targets = query_as::<Postgres, DiscountTarget>(LIST_DISCOUNT_TARGETS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_discount: FxHashMap<DiscountUuid, Vec<EntityRef>> = FxHashMap::default();

        for target in targets {
            by_discount
                .entry(target.discount_uuid)
                .or_default()
                .push(target.entity);
        }

        for record in records {
            for entity in by_discount.remove(&record.uuid).unwrap_or_default() {
                match entity.kind {
                    EntityKind::Product => record
                        .product_uuids
                        .push(ProductUuid::from_uuid(entity.uuid)),
                    EntityKind::Bundle => {
                        record.bundle_uuids.push(BundleUuid::from_uuid(entity.uuid));
                    }
                }
            }
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for DiscountRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let start: SqlxTimestamp = row.try_get("start_date")?;
        let end: SqlxTimestamp = row.try_get("end_date")?;
        let kind: String = row.try_get("kind")?;

        Ok(Self {
            uuid: DiscountUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            window: DateWindow::new(start.to_jiff(), end.to_jiff()).map_err(|error| {
                sqlx::Error::ColumnDecode {
                    index: "end_date".to_string(),
                    source: Box::new(error),
                }
            })?,
            discount: decode_percent(row, "discount")?,
            kind: kind
                .parse::<PriceBase>()
                .map_err(|error| sqlx::Error::ColumnDecode {
                    index: "kind".to_string(),
                    source: Box::new(error),
                })?,
            product_uuids: Vec::new(),
            bundle_uuids: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for DiscountTarget {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            discount_uuid: DiscountUuid::from_uuid(row.try_get("discount_uuid")?),
            entity: EntityRef::from_row(row)?,
        })
    }
}
