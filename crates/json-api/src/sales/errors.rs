//! Sale Errors

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::domain::sales::SalesServiceError;

use crate::pricing::pricing_status_error;

pub(crate) fn into_status_error(error: SalesServiceError) -> StatusError {
    match error {
        SalesServiceError::AlreadyExists => StatusError::conflict().brief("Sale already exists"),
        SalesServiceError::NotFound => StatusError::not_found().brief("Sale not found"),
        SalesServiceError::CategoryNotInSale => {
            StatusError::unprocessable_entity().brief("Category is not part of this sale")
        }
        SalesServiceError::InvalidReference => {
            StatusError::bad_request().brief("Category does not exist")
        }
        SalesServiceError::MissingRequiredData | SalesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid sale payload")
        }
        SalesServiceError::Pricing(error) => pricing_status_error(&error),
        SalesServiceError::Sql(source) => {
            error!("sale storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use bazaar_pricing::error::PricingError;
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn sale_errors_map_to_statuses() {
        assert_eq!(
            into_status_error(SalesServiceError::CategoryNotInSale).code,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            into_status_error(SalesServiceError::Pricing(PricingError::SaleEnded)).code,
            StatusCode::CONFLICT
        );
        assert_eq!(
            into_status_error(SalesServiceError::Pricing(PricingError::InvalidWindow)).code,
            StatusCode::BAD_REQUEST
        );
    }
}
