//! Sales service errors.

use bazaar_pricing::{
    error::{ErrorKind as PricingErrorKind, PricingError},
    sale::CategoryPercentError,
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::pricing::PriceLedgerError;

#[derive(Debug, Error)]
pub enum SalesServiceError {
    #[error("sale already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("category is not part of this sale")]
    CategoryNotInSale,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SalesServiceError {
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

impl From<PriceLedgerError> for SalesServiceError {
    fn from(error: PriceLedgerError) -> Self {
        match error {
            PriceLedgerError::NotFound => Self::NotFound,
            PriceLedgerError::Pricing(error) => Self::Pricing(error),
            PriceLedgerError::Sql(error) => Self::from(error),
        }
    }
}

impl From<CategoryPercentError> for SalesServiceError {
    fn from(error: CategoryPercentError) -> Self {
        match error {
            CategoryPercentError::NotPositive => Self::InvalidData,
            CategoryPercentError::TooLarge => Self::Pricing(PricingError::InvalidDiscountValue),
        }
    }
}

impl PricingErrorKind for SalesServiceError {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::InvalidReference | Self::MissingRequiredData | Self::InvalidData => {
                "validation_failed"
            }
            Self::CategoryNotInSale => "category_not_in_sale",
            Self::Pricing(error) => error.kind(),
            Self::Sql(_) => "storage",
        }
    }
}
