//! Price ledger errors.

use bazaar_pricing::error::{ErrorKind, PricingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceLedgerError {
    #[error("priced entity not found")]
    NotFound,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for PriceLedgerError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

impl ErrorKind for PriceLedgerError {
    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Pricing(error) => error.kind(),
            Self::Sql(_) => "storage",
        }
    }
}
