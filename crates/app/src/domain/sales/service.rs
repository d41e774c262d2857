//! Sales service.
//!
//! Every membership change is planned once per request from the sale's phase,
//! then carried out per item in its own transaction. Bundles follow their
//! members: enrolling a product enrolls each bundle containing it, and the
//! bundle's sale layer is kept at the largest category percentage in scope,
//! taken off the members' own selling prices.

use async_trait::async_trait;
use bazaar_pricing::{
    batch::BatchOutcome,
    bundle::find_duplicate,
    error::PricingError,
    sale::{PricingAction, SaleOperation, bundle_percent, category_percent, validate_category_percent},
    state::{AdminLayer, LayerSource},
    window::DateWindow,
};
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    database::{Db, RowLock},
    domain::{
        bundles::records::BundleUuid,
        categories::records::CategoryUuid,
        pagination::{ListParams, Page},
        pricing::{
            PriceLedger,
            records::{EntityKind, EntityRef, RepricedEntity},
        },
        products::records::ProductUuid,
        sales::{
            BundleMembership,
            data::NewSale,
            errors::SalesServiceError,
            membership::Reconciled,
            records::{BundleOrigin, MembershipChange, SaleRecord, SaleSort, SaleUuid},
            repository::PgSalesRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgSalesService {
    db: Db,
    repository: PgSalesRepository,
    ledger: PriceLedger,
    bundles: BundleMembership,
}

impl PgSalesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSalesRepository::new(),
            ledger: PriceLedger::new(),
            bundles: BundleMembership::new(),
        }
    }

    /// Reconcile pricing, then plan `operation` against the sale's phase at `now`.
    async fn plan(
        &self,
        sale: SaleUuid,
        operation: SaleOperation,
        now: Timestamp,
    ) -> Result<PricingAction, SalesServiceError> {
        if let Err(error) = self.sync_sale_pricing(sale, now).await {
            warn!(sale_uuid = %sale, "failed to sync sale pricing: {error}");
        }

        let record = self.get_sale(sale).await?;

        Ok(record.phase(now).plan(operation)?)
    }

    async fn enroll_product(
        &self,
        sale: SaleUuid,
        product: ProductUuid,
        action: PricingAction,
    ) -> Result<MembershipChange, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;
        let member = self.repository.product_member(&mut tx, sale, product).await?;
        let entity = EntityRef::product(product.into_uuid());

        if member.availability.is_deleted {
            return Err(SalesServiceError::NotFound);
        }

        let percent = category_percent(
            &record.category_discounts(),
            member.category_uuid.into_uuid(),
        )
        .ok_or(SalesServiceError::CategoryNotInSale)?;

        if member.is_enrolled {
            return Ok(MembershipChange::unchanged(entity));
        }

        self.repository.enroll_product(&mut tx, sale, product).await?;

        let repriced = match action {
            PricingAction::Apply => Some(
                self.ledger
                    .apply(&mut tx, entity, AdminLayer::sale(sale.into_uuid(), percent))
                    .await?,
            ),
            PricingAction::RecordOnly | PricingAction::Reverse => {
                if !member.availability.is_available() {
                    return Err(PricingError::Unavailable.into());
                }

                None
            }
        };

        let bundles = self
            .follow_member(&mut tx, &record, product, action == PricingAction::Apply)
            .await?;

        tx.commit().await?;

        Ok(MembershipChange {
            entity,
            repriced,
            bundles,
        })
    }

    async fn withdraw_product(
        &self,
        sale: SaleUuid,
        product: ProductUuid,
        action: PricingAction,
    ) -> Result<MembershipChange, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;
        let member = self.repository.product_member(&mut tx, sale, product).await?;
        let entity = EntityRef::product(product.into_uuid());

        if !member.is_enrolled {
            return Err(PricingError::NotApplied.into());
        }

        self.repository.withdraw_product(&mut tx, sale, product).await?;

        let repriced = match action {
            PricingAction::Reverse => {
                self.ledger
                    .detach(&mut tx, entity, LayerSource::Sale(sale.into_uuid()))
                    .await?
            }
            PricingAction::RecordOnly | PricingAction::Apply => None,
        };

        let bundles = self
            .follow_member(&mut tx, &record, product, action == PricingAction::Reverse)
            .await?;

        tx.commit().await?;

        Ok(MembershipChange {
            entity,
            repriced,
            bundles,
        })
    }

    async fn enroll_bundle(
        &self,
        sale: SaleUuid,
        bundle: BundleUuid,
        action: PricingAction,
    ) -> Result<MembershipChange, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;
        let entity = EntityRef::bundle(bundle.into_uuid());
        let state = self.ledger.state(&mut tx, entity).await?;

        if state.availability.is_deleted {
            return Err(SalesServiceError::NotFound);
        }

        let members = self
            .repository
            .bundle_member_categories(&mut tx, sale, bundle)
            .await?;

        let percent = bundle_percent(
            &record.category_discounts(),
            members.iter().map(|member| member.category_uuid),
        )
        .ok_or(SalesServiceError::CategoryNotInSale)?;

        let origin = self.repository.bundle_origin(&mut tx, sale, bundle).await?;

        if origin == Some(BundleOrigin::Explicit) {
            return Ok(MembershipChange::unchanged(entity));
        }

        self.repository
            .enroll_bundle(&mut tx, sale, bundle, BundleOrigin::Explicit)
            .await?;

        let repriced = match action {
            PricingAction::Apply => Some(
                self.ledger
                    .apply_bundle_sale(&mut tx, bundle.into_uuid(), sale.into_uuid(), percent)
                    .await?,
            ),
            PricingAction::RecordOnly | PricingAction::Reverse => {
                if !state.availability.is_available() {
                    return Err(PricingError::Unavailable.into());
                }

                None
            }
        };

        tx.commit().await?;

        Ok(MembershipChange {
            entity,
            repriced,
            bundles: Vec::new(),
        })
    }

    async fn withdraw_bundle(
        &self,
        sale: SaleUuid,
        bundle: BundleUuid,
        action: PricingAction,
    ) -> Result<MembershipChange, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;
        let entity = EntityRef::bundle(bundle.into_uuid());

        self.ledger.state(&mut tx, entity).await?;

        if self
            .repository
            .bundle_origin(&mut tx, sale, bundle)
            .await?
            .is_none()
        {
            return Err(PricingError::NotApplied.into());
        }

        self.repository.withdraw_bundle(&mut tx, sale, bundle).await?;

        let priced = action == PricingAction::Reverse;

        let mut repriced = if priced {
            self.ledger
                .detach(&mut tx, entity, LayerSource::Sale(sale.into_uuid()))
                .await?
        } else {
            None
        };

        // Bundles with enrolled members stay in the sale at their automatic percentage.
        let mut bundles = Vec::new();

        if let Reconciled::Member(followed) =
            self.bundles.reconcile(&mut tx, &record, bundle, priced).await?
        {
            bundles.push(bundle);

            if followed.is_some() {
                repriced = followed;
            }
        }

        tx.commit().await?;

        Ok(MembershipChange {
            entity,
            repriced,
            bundles,
        })
    }

    /// Reconcile every bundle containing `product` after its membership changed.
    async fn follow_member(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &SaleRecord,
        product: ProductUuid,
        priced: bool,
    ) -> Result<Vec<BundleUuid>, SalesServiceError> {
        let mut followed = Vec::new();

        for bundle in self.repository.bundles_containing(tx, product).await? {
            if let Reconciled::Member(_) = self.bundles.reconcile(tx, record, bundle, priced).await? {
                followed.push(bundle);
            }
        }

        Ok(followed)
    }

    /// Apply the sale layer to one enrolled member that does not carry it yet.
    async fn price_member(
        &self,
        sale: SaleUuid,
        entity: EntityRef,
    ) -> Result<Option<RepricedEntity>, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;

        let repriced = match entity.kind {
            EntityKind::Product => {
                let member = self
                    .repository
                    .product_member(&mut tx, sale, ProductUuid::from_uuid(entity.uuid))
                    .await?;

                let percent = category_percent(
                    &record.category_discounts(),
                    member.category_uuid.into_uuid(),
                )
                .ok_or(SalesServiceError::CategoryNotInSale)?;

                Some(
                    self.ledger
                        .apply(&mut tx, entity, AdminLayer::sale(sale.into_uuid(), percent))
                        .await?,
                )
            }
            EntityKind::Bundle => match self
                .bundles
                .reconcile(&mut tx, &record, BundleUuid::from_uuid(entity.uuid), true)
                .await?
            {
                Reconciled::Member(repriced) => repriced,
                Reconciled::Outside => None,
            },
        };

        tx.commit().await?;

        Ok(repriced)
    }

    /// Drop the sale layer from one member of an ended sale.
    async fn unprice_member(
        &self,
        sale: SaleUuid,
        entity: EntityRef,
    ) -> Result<Option<RepricedEntity>, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.lock_sale(&mut tx, sale, RowLock::Share).await?;

        let repriced = self
            .ledger
            .detach(&mut tx, entity, LayerSource::Sale(sale.into_uuid()))
            .await?;

        tx.commit().await?;

        Ok(repriced)
    }

    async fn run_batch<T, F, Fut>(
        &self,
        items: Vec<T>,
        key: impl Fn(T) -> Uuid,
        mut run: F,
    ) -> BatchOutcome<Uuid, MembershipChange>
    where
        T: Copy,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<MembershipChange, SalesServiceError>>,
    {
        let mut outcome = BatchOutcome::new();

        for item in items {
            let uuid = key(item);
            let result = run(item).await;

            if let Err(error) = &result {
                warn!(entity_uuid = %uuid, "sale membership change failed: {error}");
            }

            outcome.record(uuid, result);
        }

        outcome
    }
}

/// Validated `(category, percentage)` pairs for a new sale.
fn validate_categories(sale: &NewSale) -> Result<Vec<(CategoryUuid, Decimal)>, SalesServiceError> {
    if sale.categories.is_empty() {
        return Err(SalesServiceError::InvalidData);
    }

    let uuids: Vec<CategoryUuid> = sale
        .categories
        .iter()
        .map(|category| category.category_uuid)
        .collect();

    if find_duplicate(&uuids).is_some() {
        return Err(SalesServiceError::InvalidData);
    }

    sale.categories
        .iter()
        .map(|category| -> Result<_, SalesServiceError> {
            let percent = validate_category_percent(category.discount)?;

            Ok((category.category_uuid, percent.value()))
        })
        .collect()
}

#[async_trait]
impl SalesService for PgSalesService {
    async fn list_sales(
        &self,
        params: ListParams<SaleSort>,
    ) -> Result<Page<SaleRecord>, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let page = self.repository.list_sales(&mut tx, &params).await?;

        tx.commit().await?;

        Ok(page)
    }

    async fn get_sale(&self, sale: SaleUuid) -> Result<SaleRecord, SalesServiceError> {
        let mut tx = self.db.begin().await?;

        let sale = self.repository.get_sale(&mut tx, sale).await?;

        tx.commit().await?;

        Ok(sale)
    }

    #[tracing::instrument(
        name = "sales.service.create_sale",
        skip(self, sale),
        fields(sale_uuid = %sale.uuid, category_count = sale.categories.len()),
        err
    )]
    async fn create_sale(&self, sale: NewSale) -> Result<SaleRecord, SalesServiceError> {
        if sale.name.trim().is_empty() {
            return Err(SalesServiceError::MissingRequiredData);
        }

        DateWindow::new(sale.start_date, sale.end_date)?;

        let categories = validate_categories(&sale)?;

        let mut tx = self.db.begin().await?;

        self.repository.create_sale(&mut tx, &sale).await?;

        let inserted = self
            .repository
            .insert_categories(&mut tx, sale.uuid, &categories)
            .await?;

        if usize::try_from(inserted).ok() != Some(categories.len()) {
            return Err(SalesServiceError::InvalidReference);
        }

        let created = self.repository.get_sale(&mut tx, sale.uuid).await?;

        tx.commit().await?;

        info!(sale_uuid = %created.uuid, name = %created.name, "created sale");

        Ok(created)
    }

    #[tracing::instrument(
        name = "sales.service.delete_sale",
        skip(self),
        fields(sale_uuid = %sale, reversed_count = tracing::field::Empty),
        err
    )]
    async fn delete_sale(&self, sale: SaleUuid) -> Result<(), SalesServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.lock_sale(&mut tx, sale, RowLock::Update).await?;

        let source = LayerSource::Sale(sale.into_uuid());
        let linked = self.ledger.adjusted_by(&mut tx, source).await?;

        let mut reversed = 0_usize;

        for entity in linked {
            if self.ledger.detach(&mut tx, entity, source).await?.is_some() {
                reversed += 1;
            }
        }

        Span::current().record("reversed_count", reversed);

        self.repository.clear_enrollments(&mut tx, sale).await?;

        let rows_affected = self.repository.delete_sale(&mut tx, sale).await?;

        if rows_affected == 0 {
            return Err(SalesServiceError::NotFound);
        }

        tx.commit().await?;

        info!(sale_uuid = %sale, reversed, "deleted sale");

        Ok(())
    }

    #[tracing::instrument(
        name = "sales.service.enroll_products",
        skip(self, products),
        fields(
            sale_uuid = %sale,
            target_count = products.len(),
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn enroll_products(
        &self,
        sale: SaleUuid,
        products: Vec<ProductUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError> {
        let action = self.plan(sale, SaleOperation::Enroll, now).await?;

        let outcome = self
            .run_batch(products, |product| product.into_uuid(), |product| {
                self.enroll_product(sale, product, action)
            })
            .await;

        Span::current().record("failed_count", outcome.errors.len());

        info!(
            sale_uuid = %sale,
            enrolled = outcome.results.len(),
            failed = outcome.errors.len(),
            "enrolled products"
        );

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "sales.service.withdraw_products",
        skip(self, products),
        fields(
            sale_uuid = %sale,
            target_count = products.len(),
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn withdraw_products(
        &self,
        sale: SaleUuid,
        products: Vec<ProductUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError> {
        let action = self.plan(sale, SaleOperation::Withdraw, now).await?;

        let outcome = self
            .run_batch(products, |product| product.into_uuid(), |product| {
                self.withdraw_product(sale, product, action)
            })
            .await;

        Span::current().record("failed_count", outcome.errors.len());

        info!(
            sale_uuid = %sale,
            withdrawn = outcome.results.len(),
            failed = outcome.errors.len(),
            "withdrew products"
        );

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "sales.service.enroll_bundles",
        skip(self, bundles),
        fields(
            sale_uuid = %sale,
            target_count = bundles.len(),
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn enroll_bundles(
        &self,
        sale: SaleUuid,
        bundles: Vec<BundleUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError> {
        let action = self.plan(sale, SaleOperation::Enroll, now).await?;

        let outcome = self
            .run_batch(bundles, |bundle| bundle.into_uuid(), |bundle| {
                self.enroll_bundle(sale, bundle, action)
            })
            .await;

        Span::current().record("failed_count", outcome.errors.len());

        info!(
            sale_uuid = %sale,
            enrolled = outcome.results.len(),
            failed = outcome.errors.len(),
            "enrolled bundles"
        );

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "sales.service.withdraw_bundles",
        skip(self, bundles),
        fields(
            sale_uuid = %sale,
            target_count = bundles.len(),
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn withdraw_bundles(
        &self,
        sale: SaleUuid,
        bundles: Vec<BundleUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError> {
        let action = self.plan(sale, SaleOperation::Withdraw, now).await?;

        let outcome = self
            .run_batch(bundles, |bundle| bundle.into_uuid(), |bundle| {
                self.withdraw_bundle(sale, bundle, action)
            })
            .await;

        Span::current().record("failed_count", outcome.errors.len());

        info!(
            sale_uuid = %sale,
            withdrawn = outcome.results.len(),
            failed = outcome.errors.len(),
            "withdrew bundles"
        );

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "sales.service.sync_sale_pricing",
        skip(self),
        fields(
            sale_uuid = %sale,
            phase = tracing::field::Empty,
            target_count = tracing::field::Empty,
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn sync_sale_pricing(
        &self,
        sale: SaleUuid,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, SalesServiceError> {
        let record = self.get_sale(sale).await?;
        let phase = record.phase(now);
        let span = Span::current();

        span.record("phase", phase.as_str());

        let action = phase.plan(SaleOperation::Sync)?;

        let entities = {
            let mut tx = self.db.begin().await?;

            let entities = match action {
                PricingAction::RecordOnly => Vec::new(),
                PricingAction::Apply => self.repository.unpriced_members(&mut tx, sale).await?,
                PricingAction::Reverse => {
                    self.ledger
                        .adjusted_by(&mut tx, LayerSource::Sale(sale.into_uuid()))
                        .await?
                }
            };

            tx.commit().await?;

            entities
        };

        span.record("target_count", entities.len());

        let mut outcome = BatchOutcome::new();

        for entity in entities {
            let result = match action {
                PricingAction::Apply => self.price_member(sale, entity).await,
                PricingAction::RecordOnly | PricingAction::Reverse => {
                    self.unprice_member(sale, entity).await
                }
            };

            match result {
                Ok(Some(repriced)) => outcome.results.push(repriced),
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        entity_kind = %entity.kind,
                        entity_uuid = %entity.uuid,
                        "failed to sync sale pricing: {error}"
                    );

                    outcome.fail(entity.uuid, &error);
                }
            }
        }

        span.record("failed_count", outcome.errors.len());

        if !outcome.results.is_empty() || outcome.has_errors() {
            info!(
                sale_uuid = %sale,
                phase = phase.as_str(),
                repriced = outcome.results.len(),
                failed = outcome.errors.len(),
                "synced sale pricing"
            );
        }

        Ok(outcome)
    }
}

#[automock]
#[async_trait]
pub trait SalesService: Send + Sync {
    /// Retrieve a page of sales.
    async fn list_sales(
        &self,
        params: ListParams<SaleSort>,
    ) -> Result<Page<SaleRecord>, SalesServiceError>;

    /// Retrieve a single sale with its categories and enrolled members.
    async fn get_sale(&self, sale: SaleUuid) -> Result<SaleRecord, SalesServiceError>;

    /// Create a sale with its category percentages.
    async fn create_sale(&self, sale: NewSale) -> Result<SaleRecord, SalesServiceError>;

    /// Reverse every layer the sale holds, clear its enrollments and soft-delete it.
    async fn delete_sale(&self, sale: SaleUuid) -> Result<(), SalesServiceError>;

    /// Enroll products whose category is in the sale, one transaction per product.
    async fn enroll_products(
        &self,
        sale: SaleUuid,
        products: Vec<ProductUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError>;

    /// Withdraw enrolled products, one transaction per product.
    async fn withdraw_products(
        &self,
        sale: SaleUuid,
        products: Vec<ProductUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError>;

    /// Enroll bundles with at least one member in scope, one transaction per bundle.
    async fn enroll_bundles(
        &self,
        sale: SaleUuid,
        bundles: Vec<BundleUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError>;

    /// Withdraw bundles, one transaction per bundle.
    async fn withdraw_bundles(
        &self,
        sale: SaleUuid,
        bundles: Vec<BundleUuid>,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, MembershipChange>, SalesServiceError>;

    /// Bring member pricing in line with the sale's phase at `now`.
    async fn sync_sale_pricing(
        &self,
        sale: SaleUuid,
        now: Timestamp,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, SalesServiceError>;
}
