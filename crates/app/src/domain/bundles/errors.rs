//! Bundles service errors.

use bazaar_pricing::error::PricingError;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{pricing::PriceLedgerError, products::records::ProductUuid};

#[derive(Debug, Error)]
pub enum BundlesServiceError {
    #[error("bundle already exists")]
    AlreadyExists,

    #[error("bundle not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("product {0} is listed more than once")]
    DuplicateProduct(ProductUuid),

    #[error("product {0} is missing, inactive, blocked or deleted")]
    UnavailableProduct(ProductUuid),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for BundlesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<PriceLedgerError> for BundlesServiceError {
    fn from(error: PriceLedgerError) -> Self {
        match error {
            PriceLedgerError::NotFound => Self::NotFound,
            PriceLedgerError::Pricing(error) => Self::Pricing(error),
            PriceLedgerError::Sql(error) => Self::from(error),
        }
    }
}
