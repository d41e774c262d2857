//! Bazaar Domain Concerns

pub mod bundles;
pub mod categories;
pub mod discounts;
pub mod pagination;
pub mod pricing;
pub mod products;
pub mod sales;
