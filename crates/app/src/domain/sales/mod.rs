//! Sales

pub mod data;
pub mod errors;
mod membership;
pub mod records;
mod repository;
pub mod service;

pub use errors::SalesServiceError;
pub(crate) use membership::BundleMembership;
pub use service::*;
