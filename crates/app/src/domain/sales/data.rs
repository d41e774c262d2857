//! Sales Data

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    auth::Principal,
    domain::{categories::records::CategoryUuid, sales::records::SaleUuid},
};

/// A category and the raw percentage requested for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSaleCategory {
    pub category_uuid: CategoryUuid,
    pub discount: Decimal,
}

/// New Sale Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub uuid: SaleUuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub categories: Vec<NewSaleCategory>,
    pub created_by: Principal,
}
