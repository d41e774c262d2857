//! Bundle Errors

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::domain::bundles::BundlesServiceError;

use crate::pricing::pricing_status_error;

pub(crate) fn into_status_error(error: BundlesServiceError) -> StatusError {
    match error {
        BundlesServiceError::AlreadyExists => {
            StatusError::conflict().brief("Bundle already exists")
        }
        BundlesServiceError::NotFound => StatusError::not_found().brief("Bundle not found"),
        BundlesServiceError::DuplicateProduct(product) => {
            StatusError::conflict().brief(format!("Product {product} is listed more than once"))
        }
        BundlesServiceError::UnavailableProduct(product) => StatusError::bad_request().brief(
            format!("Product {product} is missing, inactive, blocked or deleted"),
        ),
        BundlesServiceError::InvalidReference
        | BundlesServiceError::MissingRequiredData
        | BundlesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid bundle payload")
        }
        BundlesServiceError::Pricing(error) => pricing_status_error(&error),
        BundlesServiceError::Sql(source) => {
            error!("bundle storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use bazaar_app::domain::products::records::ProductUuid;
    use bazaar_pricing::error::PricingError;
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn member_errors_map_to_statuses() {
        let product = ProductUuid::new();

        assert_eq!(
            into_status_error(BundlesServiceError::DuplicateProduct(product)).code,
            StatusCode::CONFLICT
        );
        assert_eq!(
            into_status_error(BundlesServiceError::UnavailableProduct(product)).code,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            into_status_error(BundlesServiceError::Pricing(PricingError::AlreadyDiscounted)).code,
            StatusCode::CONFLICT
        );
    }
}
