//! Discount Handlers

pub(crate) mod apply;
pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod remove;

#[cfg(test)]
mod tests {
    use bazaar_pricing::{percent::Percent, state::PriceBase, window::DateWindow};
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use bazaar_app::domain::discounts::records::{DiscountRecord, DiscountUuid};

    /// A discount running for the whole of 2026.
    pub(super) fn make_discount(
        uuid: DiscountUuid,
        kind: PriceBase,
    ) -> TestResult<DiscountRecord> {
        Ok(DiscountRecord {
            uuid,
            code: "WINTER20".to_string(),
            window: DateWindow::new(
                "2026-01-01T00:00:00Z".parse()?,
                "2026-12-31T23:59:59Z".parse()?,
            )?,
            discount: Percent::new(Decimal::new(20, 0))?,
            kind,
            product_uuids: Vec::new(),
            bundle_uuids: Vec::new(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        })
    }
}
