//! Discount Errors

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::domain::discounts::DiscountsServiceError;

use crate::pricing::pricing_status_error;

pub(crate) fn into_status_error(error: DiscountsServiceError) -> StatusError {
    match error {
        DiscountsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Discount code already exists")
        }
        DiscountsServiceError::NotFound => StatusError::not_found().brief("Discount not found"),
        DiscountsServiceError::Inactive => {
            StatusError::bad_request().brief("Discount is not active")
        }
        DiscountsServiceError::InvalidReference
        | DiscountsServiceError::MissingRequiredData
        | DiscountsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid discount payload")
        }
        DiscountsServiceError::Pricing(error) => pricing_status_error(&error),
        DiscountsServiceError::Sql(source) => {
            error!("discount storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
