//! Discount Records

use bazaar_pricing::{
    percent::Percent,
    state::{AdminLayer, PriceBase},
    window::DateWindow,
};
use jiff::Timestamp;

use crate::{
    domain::{
        bundles::records::BundleUuid, pagination::SortField, products::records::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Discount UUID
pub type DiscountUuid = TypedUuid<DiscountRecord>;

/// Discount Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountRecord {
    pub uuid: DiscountUuid,
    pub code: String,
    pub window: DateWindow,
    pub discount: Percent,
    pub kind: PriceBase,
    pub product_uuids: Vec<ProductUuid>,
    pub bundle_uuids: Vec<BundleUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl DiscountRecord {
    /// Whether the discount may be applied at `now`.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.deleted_at.is_none() && self.window.contains(now)
    }

    /// The layer this discount places on an entity.
    #[must_use]
    pub fn layer(&self) -> AdminLayer {
        AdminLayer::discount(self.uuid.into_uuid(), self.discount, self.kind)
    }
}

/// Discount list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscountSort {
    Code,
    Discount,
    StartDate,
    EndDate,
    #[default]
    CreatedAt,
}

impl SortField for DiscountSort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "discount" => Some(Self::Discount),
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Discount => "discount",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::CreatedAt => "created_at",
        }
    }
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::state::{LayerSource, Rounding};
    use jiff::ToSpan;
    use testresult::TestResult;

    use super::*;

    fn discount(kind: PriceBase) -> TestResult<DiscountRecord> {
        Ok(DiscountRecord {
            uuid: DiscountUuid::new(),
            code: "SPRING20".to_string(),
            window: DateWindow::new(
                "2026-03-01T00:00:00Z".parse()?,
                "2026-03-31T00:00:00Z".parse()?,
            )?,
            discount: Percent::whole(20)?,
            kind,
            product_uuids: Vec::new(),
            bundle_uuids: Vec::new(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        })
    }

    #[test]
    fn active_only_inside_window() -> TestResult {
        let record = discount(PriceBase::Mrp)?;
        let start = record.window.start();

        assert!(record.is_active(start));
        assert!(record.is_active(record.window.end()));
        assert!(!record.is_active(start.checked_sub(1.second())?));
        assert!(!record.is_active(record.window.end().checked_add(1.second())?));

        Ok(())
    }

    #[test]
    fn deleted_discount_is_never_active() -> TestResult {
        let mut record = discount(PriceBase::Mrp)?;
        let start = record.window.start();

        record.deleted_at = Some(start);

        assert!(!record.is_active(start));

        Ok(())
    }

    #[test]
    fn layer_carries_kind_and_exact_rounding() -> TestResult {
        let record = discount(PriceBase::SellingPrice)?;
        let layer = record.layer();

        assert_eq!(layer.source, LayerSource::Discount(record.uuid.into_uuid()));
        assert_eq!(layer.base, PriceBase::SellingPrice);
        assert_eq!(layer.rounding, Rounding::Exact);
        assert_eq!(layer.percent, record.discount);

        Ok(())
    }
}
