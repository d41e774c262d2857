//! Products
//!
//! Seller listed products priced from their list price and seller discount,
//! plus admin moderation.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
