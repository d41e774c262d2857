//! Sale Records

use std::{fmt, str::FromStr};

use bazaar_pricing::{
    percent::Percent,
    sale::{CategoryDiscount, SalePhase},
    window::DateWindow,
};
use jiff::Timestamp;
use thiserror::Error;

use crate::{
    auth::Principal,
    domain::{
        bundles::records::BundleUuid,
        categories::records::CategoryUuid,
        pagination::SortField,
        pricing::records::{EntityRef, RepricedEntity},
        products::records::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Sale UUID
pub type SaleUuid = TypedUuid<SaleRecord>;

/// A category in scope for a sale and the percentage it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleCategory {
    pub category_uuid: CategoryUuid,
    pub discount: Percent,
}

/// How a bundle came to be enrolled in a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleOrigin {
    /// Enrolled by an admin; priced from every member in scope.
    Explicit,
    /// Enrolled because a member product was; priced from enrolled members only.
    Automatic,
}

impl BundleOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Automatic => "automatic",
        }
    }
}

impl fmt::Display for BundleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bundle origin: {0}")]
pub struct UnknownBundleOrigin(String);

impl FromStr for BundleOrigin {
    type Err = UnknownBundleOrigin;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "explicit" => Ok(Self::Explicit),
            "automatic" => Ok(Self::Automatic),
            other => Err(UnknownBundleOrigin(other.to_string())),
        }
    }
}

/// A bundle enrolled in a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleBundle {
    pub bundle_uuid: BundleUuid,
    pub origin: BundleOrigin,
}

/// Sale Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRecord {
    pub uuid: SaleUuid,
    pub name: String,
    pub description: Option<String>,
    pub window: DateWindow,
    pub categories: Vec<SaleCategory>,
    pub products: Vec<ProductUuid>,
    pub bundles: Vec<SaleBundle>,
    pub created_by: Principal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl SaleRecord {
    #[must_use]
    pub fn phase(&self, now: Timestamp) -> SalePhase {
        SalePhase::at(&self.window, now)
    }

    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.phase(now) == SalePhase::Active
    }

    /// Category percentages in the form the pricing engine expects.
    #[must_use]
    pub fn category_discounts(&self) -> Vec<CategoryDiscount> {
        self.categories
            .iter()
            .map(|category| CategoryDiscount {
                category: category.category_uuid.into_uuid(),
                percent: category.discount,
            })
            .collect()
    }
}

/// The outcome of enrolling or withdrawing one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub entity: EntityRef,
    /// New price of the entity itself, when the change touched pricing.
    pub repriced: Option<RepricedEntity>,
    /// Bundles whose enrollment or price followed from this change.
    pub bundles: Vec<BundleUuid>,
}

impl MembershipChange {
    #[must_use]
    pub fn unchanged(entity: EntityRef) -> Self {
        Self {
            entity,
            repriced: None,
            bundles: Vec::new(),
        }
    }
}

/// Sale list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaleSort {
    Name,
    StartDate,
    EndDate,
    #[default]
    CreatedAt,
}

impl SortField for SaleSort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::CreatedAt => "created_at",
        }
    }
}
