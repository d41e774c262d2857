//! Bazaar Pricing
//!
//! The pricing state machine behind the Bazaar admin API: layering admin and sale
//! discounts on top of seller pricing, reversing them exactly, aggregating bundle
//! prices and deciding what a sale is allowed to do at a given point in time.
//!
//! Nothing in this crate performs I/O; callers load a [`state::PriceState`], run it
//! through the [`engine`], and persist the result.

pub mod batch;
pub mod bundle;
pub mod engine;
pub mod error;
pub mod percent;
pub mod sale;
pub mod state;
pub mod window;

pub mod prelude;
