//! Price Adjustments
//!
//! Persistence for the admin level layer carried by products and bundles. Every
//! layer lives as one row in `price_adjustments`; the product, bundle, discount and
//! sale views are all derived from that table.

mod errors;
mod ledger;
pub mod records;
mod repository;

pub use errors::PriceLedgerError;
pub(crate) use ledger::PriceLedger;
