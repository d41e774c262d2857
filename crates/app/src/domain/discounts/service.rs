//! Discounts service.

use async_trait::async_trait;
use bazaar_pricing::{
    batch::BatchOutcome,
    percent::Percent,
    state::{LayerSource, ensure_reversible},
    window::DateWindow,
};
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    database::{Db, RowLock},
    domain::{
        discounts::{
            data::{DiscountTargets, NewDiscount},
            errors::DiscountsServiceError,
            records::{DiscountRecord, DiscountSort, DiscountUuid},
            repository::PgDiscountsRepository,
        },
        pagination::{ListParams, Page},
        pricing::{
            PriceLedger,
            records::{EntityRef, RepricedEntity},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgDiscountsService {
    db: Db,
    repository: PgDiscountsRepository,
    ledger: PriceLedger,
}

impl PgDiscountsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgDiscountsRepository::new(),
            ledger: PriceLedger::new(),
        }
    }

    async fn apply_one(
        &self,
        discount: DiscountUuid,
        entity: EntityRef,
    ) -> Result<RepricedEntity, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .lock_discount(&mut tx, discount, RowLock::Share)
            .await?;

        let repriced = self.ledger.apply(&mut tx, entity, record.layer()).await?;

        tx.commit().await?;

        Ok(repriced)
    }

    async fn remove_one(
        &self,
        discount: DiscountUuid,
        entity: EntityRef,
    ) -> Result<RepricedEntity, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let repriced = self
            .ledger
            .reverse(&mut tx, entity, LayerSource::Discount(discount.into_uuid()))
            .await?;

        tx.commit().await?;

        Ok(repriced)
    }
}

#[async_trait]
impl DiscountsService for PgDiscountsService {
    async fn list_discounts(
        &self,
        params: ListParams<DiscountSort>,
    ) -> Result<Page<DiscountRecord>, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let page = self.repository.list_discounts(&mut tx, &params).await?;

        tx.commit().await?;

        Ok(page)
    }

    async fn get_discount(
        &self,
        discount: DiscountUuid,
    ) -> Result<DiscountRecord, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let discount = self.repository.get_discount(&mut tx, discount).await?;

        tx.commit().await?;

        Ok(discount)
    }

    #[tracing::instrument(
        name = "discounts.service.create_discount",
        skip(self, discount),
        fields(discount_uuid = %discount.uuid, kind = %discount.kind),
        err
    )]
    async fn create_discount(
        &self,
        discount: NewDiscount,
    ) -> Result<DiscountRecord, DiscountsServiceError> {
        if discount.code.trim().is_empty() {
            return Err(DiscountsServiceError::MissingRequiredData);
        }

        DateWindow::new(discount.start_date, discount.end_date)?;

        let percent = Percent::new(discount.discount)?;

        ensure_reversible(percent, discount.kind)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_discount(&mut tx, &discount).await?;

        tx.commit().await?;

        info!(discount_uuid = %created.uuid, code = %created.code, "created discount");

        Ok(created)
    }

    #[tracing::instrument(
        name = "discounts.service.delete_discount",
        skip(self),
        fields(discount_uuid = %discount, reversed_count = tracing::field::Empty),
        err
    )]
    async fn delete_discount(&self, discount: DiscountUuid) -> Result<(), DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository
            .lock_discount(&mut tx, discount, RowLock::Update)
            .await?;

        let source = LayerSource::Discount(discount.into_uuid());
        let linked = self.ledger.adjusted_by(&mut tx, source).await?;

        let mut reversed = 0_usize;

        for entity in linked {
            if self.ledger.detach(&mut tx, entity, source).await?.is_some() {
                reversed += 1;
            }
        }

        Span::current().record("reversed_count", reversed);

        let rows_affected = self.repository.delete_discount(&mut tx, discount).await?;

        if rows_affected == 0 {
            return Err(DiscountsServiceError::NotFound);
        }

        tx.commit().await?;

        info!(discount_uuid = %discount, reversed, "deleted discount");

        Ok(())
    }

    #[tracing::instrument(
        name = "discounts.service.apply_discount",
        skip(self, targets),
        fields(
            discount_uuid = %discount,
            target_count = tracing::field::Empty,
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn apply_discount(
        &self,
        discount: DiscountUuid,
        targets: DiscountTargets,
        point_in_time: Timestamp,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, DiscountsServiceError> {
        let record = self.get_discount(discount).await?;

        if !record.is_active(point_in_time) {
            return Err(DiscountsServiceError::Inactive);
        }

        let entities = targets.entities();
        let span = Span::current();

        span.record("target_count", entities.len());

        let mut outcome = BatchOutcome::new();

        for entity in entities {
            let result = self.apply_one(discount, entity).await;

            if let Err(error) = &result {
                warn!(entity_kind = %entity.kind, entity_uuid = %entity.uuid, "failed to apply discount: {error}");
            }

            outcome.record(entity.uuid, result);
        }

        span.record("failed_count", outcome.errors.len());

        info!(
            discount_uuid = %discount,
            applied = outcome.results.len(),
            failed = outcome.errors.len(),
            "applied discount"
        );

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "discounts.service.remove_discount",
        skip(self, targets),
        fields(
            discount_uuid = %discount,
            target_count = tracing::field::Empty,
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn remove_discount(
        &self,
        discount: DiscountUuid,
        targets: DiscountTargets,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, DiscountsServiceError> {
        self.get_discount(discount).await?;

        let entities = targets.entities();
        let span = Span::current();

        span.record("target_count", entities.len());

        let mut outcome = BatchOutcome::new();

        for entity in entities {
            let result = self.remove_one(discount, entity).await;

            if let Err(error) = &result {
                warn!(entity_kind = %entity.kind, entity_uuid = %entity.uuid, "failed to remove discount: {error}");
            }

            outcome.record(entity.uuid, result);
        }

        span.record("failed_count", outcome.errors.len());

        info!(
            discount_uuid = %discount,
            removed = outcome.results.len(),
            failed = outcome.errors.len(),
            "removed discount"
        );

        Ok(outcome)
    }
}

#[automock]
#[async_trait]
pub trait DiscountsService: Send + Sync {
    /// Retrieve a page of discounts.
    async fn list_discounts(
        &self,
        params: ListParams<DiscountSort>,
    ) -> Result<Page<DiscountRecord>, DiscountsServiceError>;

    /// Retrieve a single discount with the entities it currently layers.
    async fn get_discount(
        &self,
        discount: DiscountUuid,
    ) -> Result<DiscountRecord, DiscountsServiceError>;

    /// Create a discount.
    async fn create_discount(
        &self,
        discount: NewDiscount,
    ) -> Result<DiscountRecord, DiscountsServiceError>;

    /// Reverse every layer the discount holds, then soft-delete it.
    async fn delete_discount(&self, discount: DiscountUuid) -> Result<(), DiscountsServiceError>;

    /// Layer an active discount onto each target, one transaction per target.
    async fn apply_discount(
        &self,
        discount: DiscountUuid,
        targets: DiscountTargets,
        point_in_time: Timestamp,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, DiscountsServiceError>;

    /// Reverse the discount on each target, one transaction per target.
    async fn remove_discount(
        &self,
        discount: DiscountUuid,
        targets: DiscountTargets,
    ) -> Result<BatchOutcome<Uuid, RepricedEntity>, DiscountsServiceError>;
}
