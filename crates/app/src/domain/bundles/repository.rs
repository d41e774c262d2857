//! Bundles Repository

use bazaar_pricing::{percent::Percent, state::Availability};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    auth::decode_principal_columns,
    domain::{
        bundles::{
            data::NewBundle,
            records::{BundleMember, BundleRecord, BundleSort, BundleUuid},
        },
        pagination::{Counted, ListParams, Page},
        pricing::records::{decode_layer, decode_percent},
        products::records::ProductUuid,
    },
};

const LIST_BUNDLES_SQL: &str = include_str!("sql/list_bundles.sql");
const GET_BUNDLE_SQL: &str = include_str!("sql/get_bundle.sql");
const LIST_BUNDLE_MEMBERS_SQL: &str = include_str!("sql/list_bundle_members.sql");
const FIND_MEMBER_CANDIDATES_SQL: &str = include_str!("sql/find_member_candidates.sql");
const CREATE_BUNDLE_SQL: &str = include_str!("sql/create_bundle.sql");
const INSERT_BUNDLE_MEMBERS_SQL: &str = include_str!("sql/insert_bundle_members.sql");
const DELETE_BUNDLE_MEMBERS_SQL: &str = include_str!("sql/delete_bundle_members.sql");
const CLEAR_BUNDLE_MEMBERS_SQL: &str = include_str!("sql/clear_bundle_members.sql");
const UPDATE_BUNDLE_PRICING_SQL: &str = include_str!("sql/update_bundle_pricing.sql");
const UPDATE_BUNDLE_SQL: &str = include_str!("sql/update_bundle.sql");
const DEACTIVATE_BUNDLE_SQL: &str = include_str!("sql/deactivate_bundle.sql");
const DELETE_BUNDLE_SALE_ENROLLMENTS_SQL: &str =
    include_str!("sql/delete_bundle_sale_enrollments.sql");
const DELETE_BUNDLE_SQL: &str = include_str!("sql/delete_bundle.sql");

/// A stored bundle member and its place in the bundle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberLine {
    pub bundle_uuid: BundleUuid,
    pub member: BundleMember,
    pub position: i32,
}

/// A product considered for bundle membership.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberCandidate {
    pub uuid: ProductUuid,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub availability: Availability,
}

/// Bundle columns with the members joined in afterwards.
#[derive(Debug)]
struct BundleRow(BundleRecord);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBundlesRepository;

impl PgBundlesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_bundles(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        params: &ListParams<BundleSort>,
    ) -> Result<Page<BundleRecord>, sqlx::Error> {
        let sql = params.render(LIST_BUNDLES_SQL);

        let rows = query_as::<Postgres, Counted<BundleRow>>(&sql)
            .bind(params.search_pattern())
            .bind(i64::from(params.limit()))
            .bind(params.offset())
            .fetch_all(&mut **tx)
            .await?;

        let page = Page::from_counted(rows, params).map(|BundleRow(bundle)| bundle);
        let uuids: Vec<BundleUuid> = page.items.iter().map(|bundle| bundle.uuid).collect();

        let mut members: FxHashMap<BundleUuid, Vec<BundleMember>> = FxHashMap::default();

        for line in self.members_of(tx, &uuids).await? {
            members.entry(line.bundle_uuid).or_default().push(line.member);
        }

        Ok(page.map(|mut bundle| {
            bundle.products = members.remove(&bundle.uuid).unwrap_or_default();
            bundle
        }))
    }

    pub(crate) async fn get_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<BundleRecord, sqlx::Error> {
        let BundleRow(mut record) = query_as::<Postgres, BundleRow>(GET_BUNDLE_SQL)
            .bind(bundle.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        record.products = self
            .members(tx, bundle)
            .await?
            .into_iter()
            .map(|line| line.member)
            .collect();

        Ok(record)
    }

    /// Members of one bundle in position order.
    pub(crate) async fn members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<Vec<MemberLine>, sqlx::Error> {
        self.members_of(tx, &[bundle]).await
    }

    async fn members_of(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundles: &[BundleUuid],
    ) -> Result<Vec<MemberLine>, sqlx::Error> {
        if bundles.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = bundles.iter().map(|bundle| bundle.into_uuid()).collect();

        query_as::<Postgres, MemberLine>(LIST_BUNDLE_MEMBERS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Lock and read the products that would join a bundle.
    pub(crate) async fn member_candidates(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<FxHashMap<ProductUuid, MemberCandidate>, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|product| product.into_uuid()).collect();

        let candidates = query_as::<Postgres, MemberCandidate>(FIND_MEMBER_CANDIDATES_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        Ok(candidates
            .into_iter()
            .map(|candidate| (candidate.uuid, candidate))
            .collect())
    }

    pub(crate) async fn create_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: &NewBundle,
        discount: Percent,
        mrp: Decimal,
        selling_price: Decimal,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_BUNDLE_SQL)
            .bind(bundle.uuid.into_uuid())
            .bind(&bundle.name)
            .bind(mrp)
            .bind(selling_price)
            .bind(discount.value())
            .bind(bundle.created_by.uuid)
            .bind(bundle.created_by.role.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Append members starting at `first_position`.
    pub(crate) async fn insert_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        members: &[BundleMember],
        first_position: i32,
    ) -> Result<(), sqlx::Error> {
        let mut products = Vec::with_capacity(members.len());
        let mut quantities = Vec::with_capacity(members.len());
        let mut positions = Vec::with_capacity(members.len());

        for (offset, member) in members.iter().enumerate() {
            let offset = i32::try_from(offset).map_err(|error| sqlx::Error::Encode(Box::new(error)))?;
            let quantity =
                i32::try_from(member.quantity).map_err(|error| sqlx::Error::Encode(Box::new(error)))?;

            products.push(member.product_uuid.into_uuid());
            quantities.push(quantity);
            positions.push(first_position.saturating_add(offset));
        }

        query(INSERT_BUNDLE_MEMBERS_SQL)
            .bind(bundle.into_uuid())
            .bind(products)
            .bind(quantities)
            .bind(positions)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn remove_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        products: &[ProductUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|product| product.into_uuid()).collect();

        let rows_affected = query(DELETE_BUNDLE_MEMBERS_SQL)
            .bind(bundle.into_uuid())
            .bind(uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<(), sqlx::Error> {
        query(CLEAR_BUNDLE_MEMBERS_SQL)
            .bind(bundle.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn update_pricing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        mrp: Decimal,
        selling_price: Decimal,
    ) -> Result<(), sqlx::Error> {
        query(UPDATE_BUNDLE_PRICING_SQL)
            .bind(bundle.into_uuid())
            .bind(mrp)
            .bind(selling_price)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn update_details(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        name: Option<&str>,
        discount: Percent,
        is_active: Option<bool>,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_BUNDLE_SQL)
            .bind(bundle.into_uuid())
            .bind(name)
            .bind(discount.value())
            .bind(is_active)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn deactivate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<(), sqlx::Error> {
        query(DEACTIVATE_BUNDLE_SQL)
            .bind(bundle.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete_sale_enrollments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_BUNDLE_SALE_ENROLLMENTS_SQL)
            .bind(bundle.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_BUNDLE_SQL)
            .bind(bundle.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn decode_quantity(row: &PgRow) -> sqlx::Result<u32> {
    let quantity: i32 = row.try_get("quantity")?;

    u32::try_from(quantity).map_err(|error| sqlx::Error::ColumnDecode {
        index: "quantity".to_string(),
        source: Box::new(error),
    })
}

impl<'r> FromRow<'r, PgRow> for BundleRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(BundleRecord {
            uuid: BundleUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            mrp: row.try_get("mrp")?,
            selling_price: row.try_get("selling_price")?,
            discount: decode_percent(row, "discount")?,
            products: Vec::new(),
            created_by: decode_principal_columns(row, "created_by_uuid", "created_by_role")?,
            is_active: row.try_get("is_active")?,
            is_blocked: row.try_get("is_blocked")?,
            adjustment: decode_layer(row)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for MemberLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            bundle_uuid: BundleUuid::from_uuid(row.try_get("bundle_uuid")?),
            member: BundleMember {
                product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
                quantity: decode_quantity(row)?,
            },
            position: row.try_get("position")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for MemberCandidate {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            mrp: row.try_get("mrp")?,
            selling_price: row.try_get("selling_price")?,
            availability: Availability {
                is_active: row.try_get("is_active")?,
                is_blocked: row.try_get("is_blocked")?,
                is_deleted: row.try_get("is_deleted")?,
            },
        })
    }
}
