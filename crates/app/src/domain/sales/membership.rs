//! Bundle Sale Membership
//!
//! Bundles follow their members into and out of sales. A bundle with an enrolled
//! member is enrolled automatically and priced at the largest category percentage
//! among its enrolled members; once none remain it is withdrawn again. Explicit
//! enrollments stay put and are priced from every member in scope.

use bazaar_pricing::{
    sale::{SalePhase, bundle_percent},
    state::LayerSource,
};
use jiff::Timestamp;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::RowLock,
    domain::{
        bundles::records::BundleUuid,
        pricing::{
            PriceLedger, PriceLedgerError,
            records::{EntityRef, RepricedEntity},
        },
        sales::{
            records::{BundleOrigin, SaleRecord, SaleUuid},
            repository::PgSalesRepository,
        },
    },
};

/// A bundle's place in a sale after its members changed.
#[derive(Debug)]
pub(crate) enum Reconciled {
    /// Not enrolled.
    Outside,
    /// Enrolled, with the new price when pricing was touched.
    Member(Option<RepricedEntity>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BundleMembership {
    repository: PgSalesRepository,
    ledger: PriceLedger,
}

impl BundleMembership {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            repository: PgSalesRepository::new(),
            ledger: PriceLedger::new(),
        }
    }

    /// Bring a bundle's enrollment and sale layer in line with its members.
    ///
    /// Pricing failures on the bundle are logged and leave its price as it was.
    pub(crate) async fn reconcile(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &SaleRecord,
        bundle: BundleUuid,
        priced: bool,
    ) -> Result<Reconciled, PriceLedgerError> {
        let entity = EntityRef::bundle(bundle.into_uuid());
        let source = LayerSource::Sale(record.uuid.into_uuid());

        let members = self
            .repository
            .bundle_member_categories(tx, record.uuid, bundle)
            .await?;

        let enrolled: Vec<Uuid> = members
            .iter()
            .filter(|member| member.is_enrolled)
            .map(|member| member.category_uuid)
            .collect();

        let origin = match self.repository.bundle_origin(tx, record.uuid, bundle).await? {
            None if enrolled.is_empty() => return Ok(Reconciled::Outside),
            None => {
                self.repository
                    .enroll_bundle(tx, record.uuid, bundle, BundleOrigin::Automatic)
                    .await?;

                info!(sale_uuid = %record.uuid, bundle_uuid = %bundle, "enrolled bundle with an enrolled member");

                BundleOrigin::Automatic
            }
            Some(BundleOrigin::Automatic) if enrolled.is_empty() => {
                self.repository.withdraw_bundle(tx, record.uuid, bundle).await?;

                if priced {
                    self.ledger.detach(tx, entity, source).await?;
                }

                info!(sale_uuid = %record.uuid, bundle_uuid = %bundle, "withdrew bundle with no enrolled members");

                return Ok(Reconciled::Outside);
            }
            Some(origin) => origin,
        };

        if !priced {
            return Ok(Reconciled::Member(None));
        }

        let categories = record.category_discounts();

        let percent = match origin {
            BundleOrigin::Explicit => bundle_percent(
                &categories,
                members.iter().map(|member| member.category_uuid),
            ),
            BundleOrigin::Automatic => bundle_percent(&categories, enrolled),
        };

        let result = match percent {
            Some(percent) => self
                .ledger
                .apply_bundle_sale(tx, bundle.into_uuid(), record.uuid.into_uuid(), percent)
                .await
                .map(Some),
            None => self.ledger.detach(tx, entity, source).await,
        };

        match result {
            Ok(repriced) => Ok(Reconciled::Member(repriced)),
            Err(PriceLedgerError::Pricing(error)) => {
                warn!(
                    sale_uuid = %record.uuid,
                    bundle_uuid = %bundle,
                    "failed to reprice bundle for sale: {error}"
                );

                Ok(Reconciled::Member(None))
            }
            Err(error) => Err(error),
        }
    }

    /// Reconcile `bundle` with every live sale that enrolls it or one of its
    /// members, after the bundle's own membership changed.
    ///
    /// Ended sales are left alone; future sales only record membership. Returns
    /// the sales the bundle is enrolled in afterwards.
    pub(crate) async fn follow_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: BundleUuid,
        now: Timestamp,
    ) -> Result<Vec<SaleUuid>, PriceLedgerError> {
        let mut enrolled = Vec::new();

        for sale in self.repository.sales_touching_bundle(tx, bundle).await? {
            let record = self.repository.lock_sale(tx, sale, RowLock::Share).await?;

            let priced = match record.phase(now) {
                SalePhase::Ended => continue,
                SalePhase::Future => false,
                SalePhase::Active => true,
            };

            if let Reconciled::Member(_) = self.reconcile(tx, &record, bundle, priced).await? {
                enrolled.push(sale);
            }
        }

        Ok(enrolled)
    }
}
