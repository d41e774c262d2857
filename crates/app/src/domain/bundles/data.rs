//! Bundles Data

use rust_decimal::Decimal;

use crate::{
    auth::Principal,
    domain::bundles::records::{BundleMember, BundleUuid},
};

/// New Bundle Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBundle {
    pub uuid: BundleUuid,
    pub name: String,
    pub discount: Decimal,
    pub products: Vec<BundleMember>,
    pub created_by: Principal,
}

/// Bundle Update Data
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleUpdate {
    pub name: Option<String>,
    pub discount: Option<Decimal>,
    pub is_active: Option<bool>,
}
