//! Sale Membership
//!
//! A sale's phase is derived from its window once per operation and every
//! membership change is routed through [`SalePhase::plan`].

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::PricingError, percent::Percent, window::DateWindow};

/// Where a sale sits relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    /// `now < start`
    Future,

    /// `start <= now <= end`
    Active,

    /// `now > end`
    Ended,
}

/// A request that changes sale membership or pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaleOperation {
    /// Add products or bundles to the sale.
    Enroll,
    /// Take products or bundles out of the sale.
    Withdraw,
    /// Bring member prices in line with the current phase.
    Sync,
    /// Remove the sale altogether.
    Delete,
}

/// What an operation must do to member pricing in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PricingAction {
    /// Record membership only; prices are untouched.
    RecordOnly,

    /// Apply the sale layer to affected members.
    Apply,

    /// Reverse the sale layer on affected members.
    Reverse,
}

impl SalePhase {
    /// Phase of `window` at `now`.
    #[must_use]
    pub fn at(window: &DateWindow, now: Timestamp) -> Self {
        if now < window.start() {
            Self::Future
        } else if window.has_ended(now) {
            Self::Ended
        } else {
            Self::Active
        }
    }

    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }

    /// Transition table for sale operations.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::SaleEnded`] for membership changes on an ended sale.
    pub fn plan(self, operation: SaleOperation) -> Result<PricingAction, PricingError> {
        use PricingAction::{Apply, RecordOnly, Reverse};
        use SaleOperation::{Delete, Enroll, Sync, Withdraw};

        match (self, operation) {
            (Self::Future, Enroll | Withdraw | Sync) => Ok(RecordOnly),
            (Self::Active, Enroll | Sync) => Ok(Apply),
            (Self::Active, Withdraw) | (Self::Ended, Sync) | (_, Delete) => Ok(Reverse),
            (Self::Ended, Enroll | Withdraw) => Err(PricingError::SaleEnded),
        }
    }
}

/// A category scoped percentage within a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDiscount {
    /// Category the percentage applies to.
    pub category: Uuid,
    /// Percentage members of the category get.
    pub percent: Percent,
}

/// Failure validating a sale category percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CategoryPercentError {
    /// Zero or negative percentage.
    #[error("category discount must be greater than 0")]
    NotPositive,

    /// Percentage of 100 or more, which could never be reversed.
    #[error("category discount must be less than 100")]
    TooLarge,
}

/// Validate a sale category percentage, requiring `0 < p < 100`.
///
/// # Errors
///
/// See [`CategoryPercentError`].
pub fn validate_category_percent(value: Decimal) -> Result<Percent, CategoryPercentError> {
    if value <= Decimal::ZERO {
        return Err(CategoryPercentError::NotPositive);
    }

    if value >= Decimal::ONE_HUNDRED {
        return Err(CategoryPercentError::TooLarge);
    }

    Percent::new(value).ok().ok_or(CategoryPercentError::TooLarge)
}

/// Percentage a sale gives products of `category`, if the category is in scope.
#[must_use]
pub fn category_percent(categories: &[CategoryDiscount], category: Uuid) -> Option<Percent> {
    categories
        .iter()
        .find(|entry| entry.category == category)
        .map(|entry| entry.percent)
}

/// Percentage a sale gives a bundle: the largest category percentage among the
/// given member categories. `None` when no member is in scope.
#[must_use]
pub fn bundle_percent<I>(categories: &[CategoryDiscount], member_categories: I) -> Option<Percent>
where
    I: IntoIterator<Item = Uuid>,
{
    member_categories
        .into_iter()
        .filter_map(|category| category_percent(categories, category))
        .max()
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use testresult::TestResult;

    use super::*;

    fn window() -> TestResult<DateWindow> {
        Ok(DateWindow::new(
            "2026-05-01T00:00:00Z".parse()?,
            "2026-05-31T00:00:00Z".parse()?,
        )?)
    }

    #[test]
    fn phase_follows_window() -> TestResult {
        let window = window()?;

        assert_eq!(
            SalePhase::at(&window, window.start().checked_sub(1.second())?),
            SalePhase::Future
        );
        assert_eq!(SalePhase::at(&window, window.start()), SalePhase::Active);
        assert_eq!(SalePhase::at(&window, window.end()), SalePhase::Active);
        assert_eq!(
            SalePhase::at(&window, window.end().checked_add(1.second())?),
            SalePhase::Ended
        );

        Ok(())
    }

    #[test]
    fn future_sales_only_record_membership() {
        assert_eq!(
            SalePhase::Future.plan(SaleOperation::Enroll),
            Ok(PricingAction::RecordOnly)
        );
        assert_eq!(
            SalePhase::Future.plan(SaleOperation::Withdraw),
            Ok(PricingAction::RecordOnly)
        );
    }

    #[test]
    fn active_sales_apply_and_reverse() {
        assert_eq!(
            SalePhase::Active.plan(SaleOperation::Enroll),
            Ok(PricingAction::Apply)
        );
        assert_eq!(
            SalePhase::Active.plan(SaleOperation::Sync),
            Ok(PricingAction::Apply)
        );
        assert_eq!(
            SalePhase::Active.plan(SaleOperation::Withdraw),
            Ok(PricingAction::Reverse)
        );
    }

    #[test]
    fn ended_sales_reject_membership_changes_but_allow_delete() {
        assert_eq!(
            SalePhase::Ended.plan(SaleOperation::Enroll),
            Err(PricingError::SaleEnded)
        );
        assert_eq!(
            SalePhase::Ended.plan(SaleOperation::Withdraw),
            Err(PricingError::SaleEnded)
        );
        assert_eq!(
            SalePhase::Ended.plan(SaleOperation::Delete),
            Ok(PricingAction::Reverse)
        );
        assert_eq!(
            SalePhase::Ended.plan(SaleOperation::Sync),
            Ok(PricingAction::Reverse)
        );
    }

    #[test]
    fn category_gating() -> TestResult {
        let c1 = Uuid::now_v7();
        let c2 = Uuid::now_v7();
        let categories = [CategoryDiscount {
            category: c1,
            percent: Percent::whole(30)?,
        }];

        assert_eq!(category_percent(&categories, c1), Some(Percent::whole(30)?));
        assert_eq!(category_percent(&categories, c2), None);

        Ok(())
    }

    #[test]
    fn bundles_take_the_largest_member_percentage() -> TestResult {
        let c1 = Uuid::now_v7();
        let c2 = Uuid::now_v7();
        let c3 = Uuid::now_v7();
        let categories = [
            CategoryDiscount {
                category: c1,
                percent: Percent::whole(10)?,
            },
            CategoryDiscount {
                category: c2,
                percent: Percent::whole(40)?,
            },
        ];

        assert_eq!(
            bundle_percent(&categories, [c1, c2, c3]),
            Some(Percent::whole(40)?)
        );
        assert_eq!(bundle_percent(&categories, [c3]), None);

        Ok(())
    }

    #[test]
    fn category_percent_must_be_reversible() {
        assert_eq!(
            validate_category_percent(Decimal::ONE_HUNDRED),
            Err(CategoryPercentError::TooLarge)
        );
        assert_eq!(
            validate_category_percent(Decimal::ZERO),
            Err(CategoryPercentError::NotPositive)
        );
        assert!(validate_category_percent(Decimal::new(995, 1)).is_ok());
    }
}
