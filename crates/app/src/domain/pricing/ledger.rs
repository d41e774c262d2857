//! Price Ledger
//!
//! Runs the pricing engine against locked rows and writes the selling price and
//! its `price_adjustments` edge in the caller's transaction.

use bazaar_pricing::{
    bundle::{BundleLine, apply_sale},
    engine,
    error::PricingError,
    percent::Percent,
    state::{AdminLayer, LayerSource, PriceState},
};
use sqlx::{Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use crate::domain::pricing::{
    PriceLedgerError,
    records::{EntityRef, RepricedEntity},
    repository::PgPricingRepository,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct PriceLedger {
    repository: PgPricingRepository,
}

impl PriceLedger {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            repository: PgPricingRepository::new(),
        }
    }

    /// Lock an entity and read its pricing state.
    pub(crate) async fn state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
    ) -> Result<PriceState, PriceLedgerError> {
        Ok(self.repository.lock(tx, entity).await?)
    }

    /// Layer `layer` onto the entity.
    pub(crate) async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        layer: AdminLayer,
    ) -> Result<RepricedEntity, PriceLedgerError> {
        let before = self.repository.lock(tx, entity).await?;
        let after = engine::apply_layer(&before, layer)?;

        self.store(tx, entity, &before, &after).await
    }

    /// Remove the layer `source` holds on the entity.
    pub(crate) async fn reverse(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        source: LayerSource,
    ) -> Result<RepricedEntity, PriceLedgerError> {
        let before = self.repository.lock(tx, entity).await?;
        let after = engine::reverse_layer(&before, source)?;

        self.store(tx, entity, &before, &after).await
    }

    /// Put `sale` on a bundle at `percent`, priced from its members' selling
    /// prices before that sale. Replaces a layer the same sale already holds.
    pub(crate) async fn apply_bundle_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: Uuid,
        sale: Uuid,
        percent: Percent,
    ) -> Result<RepricedEntity, PriceLedgerError> {
        let entity = EntityRef::bundle(bundle);
        let before = self.repository.lock(tx, entity).await?;
        let lines = self
            .member_lines(tx, bundle, Some(LayerSource::Sale(sale)))
            .await?;
        let after = apply_sale(&before, sale, percent, &lines)?;

        self.store(tx, entity, &before, &after).await
    }

    /// Pricing lines for a bundle's members, taken before `sale` when given.
    pub(crate) async fn member_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: Uuid,
        sale: Option<LayerSource>,
    ) -> Result<Vec<BundleLine>, PriceLedgerError> {
        let members = self.repository.lock_members(tx, bundle).await?;

        let lines = members
            .iter()
            .map(|member| match sale {
                Some(source) => BundleLine::before_sale(&member.state, member.quantity, source),
                None => Ok(BundleLine::member(&member.state, member.quantity)),
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        Ok(lines)
    }

    /// Reverse the layer `source` holds, dropping the edge even when the price
    /// cannot be restored. Returns `None` when `source` held no layer.
    pub(crate) async fn detach(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        source: LayerSource,
    ) -> Result<Option<RepricedEntity>, PriceLedgerError> {
        match self.reverse(tx, entity, source).await {
            Ok(repriced) => Ok(Some(repriced)),
            Err(PriceLedgerError::Pricing(PricingError::NotApplied)) => Ok(None),
            Err(PriceLedgerError::Pricing(error)) => {
                warn!(
                    entity_kind = %entity.kind,
                    entity_uuid = %entity.uuid,
                    "failed to restore price, dropping adjustment: {error}"
                );

                self.repository.delete_adjustment(tx, entity).await?;

                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn store(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity: EntityRef,
        before: &PriceState,
        after: &PriceState,
    ) -> Result<RepricedEntity, PriceLedgerError> {
        if before.selling_price != after.selling_price {
            self.repository
                .update_selling_price(tx, entity, after.selling_price)
                .await?;
        }

        if before.layer != after.layer {
            if before.layer.is_some() {
                self.repository.delete_adjustment(tx, entity).await?;
            }

            if let Some(layer) = &after.layer {
                self.repository.insert_adjustment(tx, entity, layer).await?;
            }
        }

        Ok(RepricedEntity {
            entity,
            selling_price: after.selling_price,
            layer: after.layer,
        })
    }

    /// Entities currently layered by `source`.
    pub(crate) async fn adjusted_by(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: LayerSource,
    ) -> Result<Vec<EntityRef>, PriceLedgerError> {
        Ok(self.repository.list_adjusted(tx, source).await?)
    }
}
