//! Discounts service errors.

use bazaar_pricing::error::{ErrorKind as PricingErrorKind, PricingError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::pricing::PriceLedgerError;

#[derive(Debug, Error)]
pub enum DiscountsServiceError {
    #[error("discount already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("discount is not active")]
    Inactive,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for DiscountsServiceError {
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

impl From<PriceLedgerError> for DiscountsServiceError {
    fn from(error: PriceLedgerError) -> Self {
        match error {
            PriceLedgerError::NotFound => Self::NotFound,
            PriceLedgerError::Pricing(error) => Self::Pricing(error),
            PriceLedgerError::Sql(error) => Self::from(error),
        }
    }
}

impl PricingErrorKind for DiscountsServiceError {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::InvalidReference
            | Self::MissingRequiredData
            | Self::InvalidData
            | Self::Inactive => "validation_failed",
            Self::Pricing(error) => error.kind(),
            Self::Sql(_) => "storage",
        }
    }
}
