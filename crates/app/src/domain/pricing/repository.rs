//! Price Adjustments Repository

use bazaar_pricing::state::{AdminLayer, LayerSource, PriceState};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction, query, query_as};
use uuid::Uuid;

use crate::domain::pricing::records::{
    EntityKind, EntityRef, MemberPrice, PriceStateRow, source_columns,
};

const LOCK_PRODUCT_PRICE_SQL: &str = include_str!("sql/lock_product_price.sql");
const LOCK_BUNDLE_PRICE_SQL: &str = include_str!("sql/lock_bundle_price.sql");
const LOCK_BUNDLE_MEMBER_PRICES_SQL: &str = include_str!("sql/lock_bundle_member_prices.sql");
const UPDATE_PRODUCT_SELLING_PRICE_SQL: &str = include_str!("sql/update_product_selling_price.sql");
const UPDATE_BUNDLE_SELLING_PRICE_SQL: &str = include_str!("sql/update_bundle_selling_price.sql");
const INSERT_ADJUSTMENT_SQL: &str = include_str!("sql/insert_adjustment.sql");
const DELETE_ADJUSTMENT_SQL: &str = include_str!("sql/delete_adjustment.sql");
const LIST_ADJUSTED_BY_DISCOUNT_SQL: &str = include_str!("sql/list_adjusted_by_discount.sql");
const LIST_ADJUSTED_BY_SALE_SQL: &str = include_str!("sql/list_adjusted_by_sale.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPricingRepository;

impl PgPricingRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Lock the entity row and read its pricing state.
    pub(crate) async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
    ) -> Result<PriceState, sqlx::Error> {
        let sql = match entity.kind {
            EntityKind::Product => LOCK_PRODUCT_PRICE_SQL,
            EntityKind::Bundle => LOCK_BUNDLE_PRICE_SQL,
        };

        let PriceStateRow(state) = query_as::<Postgres, PriceStateRow>(sql)
            .bind(entity.uuid)
            .fetch_one(&mut **tx)
            .await?;

        Ok(state)
    }

    /// Share-lock a bundle's member products and read their pricing state.
    pub(crate) async fn lock_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: Uuid,
    ) -> Result<Vec<MemberPrice>, sqlx::Error> {
        query_as::<Postgres, MemberPrice>(LOCK_BUNDLE_MEMBER_PRICES_SQL)
            .bind(bundle)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_selling_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        selling_price: Decimal,
    ) -> Result<(), sqlx::Error> {
        let sql = match entity.kind {
            EntityKind::Product => UPDATE_PRODUCT_SELLING_PRICE_SQL,
            EntityKind::Bundle => UPDATE_BUNDLE_SELLING_PRICE_SQL,
        };

        query(sql)
            .bind(entity.uuid)
            .bind(selling_price)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn insert_adjustment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        layer: &AdminLayer,
    ) -> Result<(), sqlx::Error> {
        let (source, discount_uuid, sale_uuid) = source_columns(layer.source);

        query(INSERT_ADJUSTMENT_SQL)
            .bind(entity.kind.as_str())
            .bind(entity.uuid)
            .bind(source)
            .bind(discount_uuid)
            .bind(sale_uuid)
            .bind(layer.percent.value())
            .bind(layer.base.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete_adjustment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ADJUSTMENT_SQL)
            .bind(entity.kind.as_str())
            .bind(entity.uuid)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Entities currently layered by `source`.
    pub(crate) async fn list_adjusted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: LayerSource,
    ) -> Result<Vec<EntityRef>, sqlx::Error> {
        let sql = match source {
            LayerSource::Discount(_) => LIST_ADJUSTED_BY_DISCOUNT_SQL,
            LayerSource::Sale(_) => LIST_ADJUSTED_BY_SALE_SQL,
        };

        query_as::<Postgres, EntityRef>(sql)
            .bind(source.uuid())
            .fetch_all(&mut **tx)
            .await
    }
}
