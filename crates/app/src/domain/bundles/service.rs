//! Bundles service.
//!
//! Member changes reprice the bundle and then carry it into or out of every live
//! sale that enrolls one of its members.

use async_trait::async_trait;
use bazaar_pricing::{
    bundle::{BundleLine, BundlePricing, find_duplicate, new_members, price_bundle},
    percent::Percent,
    state::{AdminLayer, PriceBase, PriceState},
};
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        bundles::{
            data::{BundleUpdate, NewBundle},
            errors::BundlesServiceError,
            records::{BundleMember, BundleRecord, BundleSort, BundleUuid},
            repository::PgBundlesRepository,
        },
        pagination::{ListParams, Page},
        pricing::{PriceLedger, records::EntityRef},
        products::records::ProductUuid,
        sales::BundleMembership,
    },
};

#[derive(Debug, Clone)]
pub struct PgBundlesService {
    db: Db,
    repository: PgBundlesRepository,
    ledger: PriceLedger,
    sales: BundleMembership,
}

impl PgBundlesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgBundlesRepository::new(),
            ledger: PriceLedger::new(),
            sales: BundleMembership::new(),
        }
    }

    /// Lock a live bundle and read its pricing state.
    async fn lock_bundle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<PriceState, BundlesServiceError> {
        let state = self
            .ledger
            .state(tx, EntityRef::bundle(bundle.into_uuid()))
            .await?;

        if state.availability.is_deleted {
            return Err(BundlesServiceError::NotFound);
        }

        Ok(state)
    }

    /// Every member must exist and be available for sale.
    async fn ensure_available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        members: &[BundleMember],
    ) -> Result<Vec<BundleLine>, BundlesServiceError> {
        let uuids: Vec<ProductUuid> = members.iter().map(|member| member.product_uuid).collect();
        let candidates = self.repository.member_candidates(tx, &uuids).await?;

        members
            .iter()
            .map(|member| match candidates.get(&member.product_uuid) {
                Some(candidate) if candidate.availability.is_available() => {
                    Ok(BundleLine::new(candidate.mrp, candidate.selling_price, member.quantity))
                }
                _ => Err(BundlesServiceError::UnavailableProduct(member.product_uuid)),
            })
            .collect()
    }

    /// Recompute the stored price from the current members, deactivating an empty
    /// bundle instead.
    async fn reprice(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        discount: Percent,
        layer: Option<AdminLayer>,
    ) -> Result<BundlePricing, BundlesServiceError> {
        let sale = layer
            .filter(|layer| layer.base == PriceBase::Members)
            .map(|layer| layer.source);
        let lines = self
            .ledger
            .member_lines(tx, bundle.into_uuid(), sale)
            .await?;
        let pricing = price_bundle(&lines, discount, layer)?;

        match pricing {
            BundlePricing::Priced { mrp, selling_price } => {
                self.repository
                    .update_pricing(tx, bundle, mrp, selling_price)
                    .await?;
            }
            BundlePricing::Empty => {
                self.repository.deactivate(tx, bundle).await?;

                info!(bundle_uuid = %bundle, "deactivated empty bundle");
            }
        }

        Ok(pricing)
    }

    /// Carry the bundle into or out of the live sales touching its members.
    async fn follow_sales(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
    ) -> Result<(), BundlesServiceError> {
        let sales = self
            .sales
            .follow_members(tx, bundle, Timestamp::now())
            .await?;

        Span::current().record("sale_count", sales.len());

        Ok(())
    }
}

fn validate_members(members: &[BundleMember]) -> Result<(), BundlesServiceError> {
    if members
        .iter()
        .any(|member| member.quantity == 0 || i32::try_from(member.quantity).is_err())
    {
        return Err(BundlesServiceError::InvalidData);
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), BundlesServiceError> {
    if name.trim().is_empty() {
        return Err(BundlesServiceError::MissingRequiredData);
    }

    Ok(())
}

#[async_trait]
impl BundlesService for PgBundlesService {
    async fn list_bundles(
        &self,
        params: ListParams<BundleSort>,
    ) -> Result<Page<BundleRecord>, BundlesServiceError> {
        let mut tx = self.db.begin().await?;

        let page = self.repository.list_bundles(&mut tx, &params).await?;

        tx.commit().await?;

        Ok(page)
    }

    async fn get_bundle(&self, bundle: BundleUuid) -> Result<BundleRecord, BundlesServiceError> {
        let mut tx = self.db.begin().await?;

        let bundle = self.repository.get_bundle(&mut tx, bundle).await?;

        tx.commit().await?;

        Ok(bundle)
    }

    #[tracing::instrument(
        name = "bundles.service.create_bundle",
        skip(self, bundle),
        fields(
            bundle_uuid = %bundle.uuid,
            product_count = bundle.products.len(),
            mrp = tracing::field::Empty,
            selling_price = tracing::field::Empty
        ),
        err
    )]
    async fn create_bundle(&self, bundle: NewBundle) -> Result<BundleRecord, BundlesServiceError> {
        validate_name(&bundle.name)?;
        validate_members(&bundle.products)?;

        let discount = Percent::new(bundle.discount)?;
        let uuids: Vec<ProductUuid> = bundle
            .products
            .iter()
            .map(|member| member.product_uuid)
            .collect();

        if let Some(duplicate) = find_duplicate(&uuids) {
            return Err(BundlesServiceError::DuplicateProduct(duplicate));
        }

        let mut tx = self.db.begin().await?;

        let lines = self.ensure_available(&mut tx, &bundle.products).await?;

        let BundlePricing::Priced { mrp, selling_price } =
            price_bundle(&lines, discount, None)?
        else {
            return Err(BundlesServiceError::MissingRequiredData);
        };

        let span = Span::current();

        span.record("mrp", tracing::field::display(mrp));
        span.record("selling_price", tracing::field::display(selling_price));

        self.repository
            .create_bundle(&mut tx, &bundle, discount, mrp, selling_price)
            .await?;

        self.repository
            .insert_members(&mut tx, bundle.uuid, &bundle.products, 0)
            .await?;

        let record = self.repository.get_bundle(&mut tx, bundle.uuid).await?;

        tx.commit().await?;

        info!(bundle_uuid = %record.uuid, "created bundle");

        Ok(record)
    }

    #[tracing::instrument(
        name = "bundles.service.update_bundle",
        skip(self, update),
        fields(bundle_uuid = %bundle),
        err
    )]
    async fn update_bundle(
        &self,
        bundle: BundleUuid,
        update: BundleUpdate,
    ) -> Result<BundleRecord, BundlesServiceError> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }

        let discount = update.discount.map(Percent::new).transpose()?;

        let mut tx = self.db.begin().await?;

        let state = self.lock_bundle(&mut tx, bundle).await?;
        let discount = discount.unwrap_or(state.base_discount);

        if update.is_active == Some(true) && self.repository.members(&mut tx, bundle).await?.is_empty() {
            return Err(BundlesServiceError::InvalidData);
        }

        self.repository
            .update_details(
                &mut tx,
                bundle,
                update.name.as_deref(),
                discount,
                update.is_active,
            )
            .await?;

        if discount != state.base_discount {
            self.reprice(&mut tx, bundle, discount, state.layer).await?;
        }

        let record = self.repository.get_bundle(&mut tx, bundle).await?;

        tx.commit().await?;

        info!(bundle_uuid = %bundle, "updated bundle");

        Ok(record)
    }

    #[tracing::instrument(
        name = "bundles.service.add_products",
        skip(self, products),
        fields(
            bundle_uuid = %bundle,
            added_count = tracing::field::Empty,
            sale_count = tracing::field::Empty
        ),
        err
    )]
    async fn add_products(
        &self,
        bundle: BundleUuid,
        products: Vec<BundleMember>,
    ) -> Result<BundleRecord, BundlesServiceError> {
        validate_members(&products)?;

        let mut tx = self.db.begin().await?;

        let state = self.lock_bundle(&mut tx, bundle).await?;
        let existing = self.repository.members(&mut tx, bundle).await?;

        let existing_uuids: Vec<ProductUuid> =
            existing.iter().map(|line| line.member.product_uuid).collect();
        let requested_uuids: Vec<ProductUuid> =
            products.iter().map(|member| member.product_uuid).collect();

        let fresh = new_members(&existing_uuids, &requested_uuids);

        Span::current().record("added_count", fresh.len());

        if !fresh.is_empty() {
            let additions: Vec<BundleMember> = fresh
                .iter()
                .filter_map(|uuid| {
                    products
                        .iter()
                        .find(|member| member.product_uuid == *uuid)
                        .copied()
                })
                .collect();

            self.ensure_available(&mut tx, &additions).await?;

            let first_position = existing
                .iter()
                .map(|line| line.position)
                .max()
                .map_or(0, |position| position.saturating_add(1));

            self.repository
                .insert_members(&mut tx, bundle, &additions, first_position)
                .await?;

            self.reprice(&mut tx, bundle, state.base_discount, state.layer)
                .await?;

            self.follow_sales(&mut tx, bundle).await?;
        }

        let record = self.repository.get_bundle(&mut tx, bundle).await?;

        tx.commit().await?;

        info!(bundle_uuid = %bundle, added = fresh.len(), "added bundle products");

        Ok(record)
    }

    #[tracing::instrument(
        name = "bundles.service.remove_products",
        skip(self, products),
        fields(
            bundle_uuid = %bundle,
            removed_count = tracing::field::Empty,
            sale_count = tracing::field::Empty
        ),
        err
    )]
    async fn remove_products(
        &self,
        bundle: BundleUuid,
        products: Vec<ProductUuid>,
    ) -> Result<BundleRecord, BundlesServiceError> {
        let mut tx = self.db.begin().await?;

        let state = self.lock_bundle(&mut tx, bundle).await?;

        let removed = self
            .repository
            .remove_members(&mut tx, bundle, &products)
            .await?;

        Span::current().record("removed_count", removed);

        if removed > 0 {
            self.reprice(&mut tx, bundle, state.base_discount, state.layer)
                .await?;

            self.follow_sales(&mut tx, bundle).await?;
        }

        let record = self.repository.get_bundle(&mut tx, bundle).await?;

        tx.commit().await?;

        info!(bundle_uuid = %bundle, removed, "removed bundle products");

        Ok(record)
    }

    #[tracing::instrument(
        name = "bundles.service.delete_bundle",
        skip(self),
        fields(bundle_uuid = %bundle, sale_enrollments = tracing::field::Empty),
        err
    )]
    async fn delete_bundle(&self, bundle: BundleUuid) -> Result<(), BundlesServiceError> {
        let mut tx = self.db.begin().await?;

        let state = self.lock_bundle(&mut tx, bundle).await?;

        if let Some(layer) = state.layer {
            self.ledger
                .detach(&mut tx, EntityRef::bundle(bundle.into_uuid()), layer.source)
                .await?;
        }

        let enrollments = self
            .repository
            .delete_sale_enrollments(&mut tx, bundle)
            .await?;

        Span::current().record("sale_enrollments", enrollments);

        self.repository.clear_members(&mut tx, bundle).await?;

        let rows_affected = self.repository.delete_bundle(&mut tx, bundle).await?;

        if rows_affected == 0 {
            return Err(BundlesServiceError::NotFound);
        }

        tx.commit().await?;

        info!(bundle_uuid = %bundle, "deleted bundle");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait BundlesService: Send + Sync {
    /// Retrieve a page of bundles.
    async fn list_bundles(
        &self,
        params: ListParams<BundleSort>,
    ) -> Result<Page<BundleRecord>, BundlesServiceError>;

    /// Retrieve a single bundle with its members.
    async fn get_bundle(&self, bundle: BundleUuid) -> Result<BundleRecord, BundlesServiceError>;

    /// Create a bundle priced from its members.
    async fn create_bundle(&self, bundle: NewBundle) -> Result<BundleRecord, BundlesServiceError>;

    /// Change the name, bundle discount or active flag.
    async fn update_bundle(
        &self,
        bundle: BundleUuid,
        update: BundleUpdate,
    ) -> Result<BundleRecord, BundlesServiceError>;

    /// Append products not already in the bundle, enrolling it in live sales
    /// that enroll one of the new members.
    async fn add_products(
        &self,
        bundle: BundleUuid,
        products: Vec<BundleMember>,
    ) -> Result<BundleRecord, BundlesServiceError>;

    /// Drop products from the bundle, deactivating it when none remain and
    /// withdrawing it from sales none of its remaining members are in.
    async fn remove_products(
        &self,
        bundle: BundleUuid,
        products: Vec<ProductUuid>,
    ) -> Result<BundleRecord, BundlesServiceError>;

    /// Soft-delete a bundle, releasing its admin layer and sale enrollments.
    async fn delete_bundle(&self, bundle: BundleUuid) -> Result<(), BundlesServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            pricing::records::Layered,
            products::ProductsService,
            sales::{
                SalesService,
                records::{BundleOrigin, SaleBundle},
            },
        },
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn create_bundle_sums_member_prices() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let b = helpers::create_product(&ctx, Decimal::from(2000), Decimal::ZERO).await?;

        let bundle = helpers::create_bundle(&ctx, &[a.uuid, b.uuid], Decimal::from(10)).await?;

        assert_eq!(bundle.mrp, Decimal::from(3000));
        assert_eq!(bundle.selling_price, Decimal::from(2700));
        assert_eq!(bundle.products.len(), 2);
        assert!(bundle.is_active);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn create_bundle_rejects_duplicates() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;

        let result = helpers::create_bundle(&ctx, &[a.uuid, a.uuid], Decimal::ZERO).await;

        assert!(
            matches!(result, Err(BundlesServiceError::DuplicateProduct(uuid)) if uuid == a.uuid),
            "expected DuplicateProduct, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn create_bundle_rejects_blocked_products() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;

        ctx.products.block_product(a.uuid).await?;

        let result = helpers::create_bundle(&ctx, &[a.uuid], Decimal::ZERO).await;

        assert!(
            matches!(result, Err(BundlesServiceError::UnavailableProduct(_))),
            "expected UnavailableProduct, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn removing_a_member_reprices_the_bundle() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let b = helpers::create_product(&ctx, Decimal::from(2000), Decimal::ZERO).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid, b.uuid], Decimal::from(10)).await?;

        let bundle = ctx.bundles.remove_products(bundle.uuid, vec![a.uuid]).await?;

        assert_eq!(bundle.mrp, Decimal::from(2000));
        assert_eq!(bundle.selling_price, Decimal::from(1800));
        assert!(bundle.is_active);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn emptied_bundle_is_deactivated_with_prices_kept() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid], Decimal::from(10)).await?;

        let bundle = ctx.bundles.remove_products(bundle.uuid, vec![a.uuid]).await?;

        assert!(!bundle.is_active);
        assert!(bundle.products.is_empty());
        assert_eq!(bundle.mrp, Decimal::from(1000));
        assert_eq!(bundle.selling_price, Decimal::from(900));

        let result = ctx
            .bundles
            .update_bundle(
                bundle.uuid,
                BundleUpdate {
                    is_active: Some(true),
                    ..BundleUpdate::default()
                },
            )
            .await;

        assert!(matches!(result, Err(BundlesServiceError::InvalidData)));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn add_products_skips_existing_members() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let b = helpers::create_product(&ctx, Decimal::from(500), Decimal::ZERO).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid], Decimal::ZERO).await?;

        let bundle = ctx
            .bundles
            .add_products(
                bundle.uuid,
                vec![
                    BundleMember::single(a.uuid),
                    BundleMember {
                        product_uuid: b.uuid,
                        quantity: 2,
                    },
                ],
            )
            .await?;

        assert_eq!(bundle.products.len(), 2);
        assert_eq!(bundle.mrp, Decimal::from(2000));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn update_bundle_discount_reprices() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid], Decimal::ZERO).await?;

        let bundle = ctx
            .bundles
            .update_bundle(
                bundle.uuid,
                BundleUpdate {
                    discount: Some(Decimal::from(25)),
                    ..BundleUpdate::default()
                },
            )
            .await?;

        assert_eq!(bundle.selling_price, Decimal::from(750));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn delete_bundle_hides_it() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::ZERO).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid], Decimal::ZERO).await?;

        ctx.bundles.delete_bundle(bundle.uuid).await?;

        let result = ctx.bundles.get_bundle(bundle.uuid).await;

        assert!(matches!(result, Err(BundlesServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn adding_an_enrolled_product_enrolls_the_bundle() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::from(10)).await?;
        let b = helpers::create_product(&ctx, Decimal::from(1000), Decimal::from(10)).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid], Decimal::from(10)).await?;
        let sale = helpers::create_active_sale(&ctx, &[(&b, 30)]).await?;

        ctx.sales
            .enroll_products(sale.uuid, vec![b.uuid], Timestamp::now())
            .await?;

        let bundle = ctx
            .bundles
            .add_products(bundle.uuid, vec![BundleMember::single(b.uuid)])
            .await?;

        // Members sell at 900 each before the sale: (900 + 900) × 0.7.
        assert_eq!(bundle.mrp, Decimal::from(2000));
        assert_eq!(bundle.selling_price, Decimal::from(1260));
        assert_eq!(bundle.sale_uuid(), Some(sale.uuid.into_uuid()));
        assert_eq!(
            helpers::stored_adjustment_base(&ctx, bundle.uuid.into_uuid()).await?,
            Some("members".to_string())
        );
        assert_eq!(
            ctx.sales.get_sale(sale.uuid).await?.bundles,
            vec![SaleBundle {
                bundle_uuid: bundle.uuid,
                origin: BundleOrigin::Automatic,
            }]
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn removing_the_last_enrolled_product_withdraws_the_bundle() -> TestResult {
        let ctx = TestContext::new().await;
        let a = helpers::create_product(&ctx, Decimal::from(1000), Decimal::from(10)).await?;
        let b = helpers::create_product(&ctx, Decimal::from(1000), Decimal::from(10)).await?;
        let bundle = helpers::create_bundle(&ctx, &[a.uuid, b.uuid], Decimal::from(10)).await?;
        let sale = helpers::create_active_sale(&ctx, &[(&b, 30)]).await?;

        ctx.sales
            .enroll_products(sale.uuid, vec![b.uuid], Timestamp::now())
            .await?;

        assert_eq!(
            ctx.bundles.get_bundle(bundle.uuid).await?.selling_price,
            Decimal::from(1260)
        );

        let bundle = ctx.bundles.remove_products(bundle.uuid, vec![b.uuid]).await?;

        assert_eq!(bundle.mrp, Decimal::from(1000));
        assert_eq!(bundle.selling_price, Decimal::from(900));
        assert!(bundle.adjustment.is_none());
        assert!(ctx.sales.get_sale(sale.uuid).await?.bundles.is_empty());
        assert_eq!(
            helpers::stored_adjustment_base(&ctx, bundle.uuid.into_uuid()).await?,
            None
        );

        Ok(())
    }
}
