//! Pagination, sorting and search query parameters.

use bazaar_app::domain::pagination::{ListParams, ListQuery, SortField};
use salvo::{oapi::ToParameters, prelude::StatusError};
use serde::Deserialize;

/// Query parameters shared by every list endpoint.
#[derive(Debug, Default, Deserialize, ToParameters)]
#[salvo(parameters(default_parameter_in = Query))]
pub(crate) struct ListQueryParams {
    /// Page number, starting at 1
    pub page: Option<u32>,

    /// Page size, 1 to 100
    pub limit: Option<u32>,

    /// Field to order by
    pub sort_field: Option<String>,

    /// `asc` or `desc`
    pub sort_order: Option<String>,

    /// Case-insensitive substring filter
    pub search: Option<String>,
}

impl ListQueryParams {
    /// Validate against the sort whitelist of `S`.
    pub(crate) fn into_list_params<S: SortField>(self) -> Result<ListParams<S>, StatusError> {
        ListParams::try_from(ListQuery {
            page: self.page,
            limit: self.limit,
            sort_field: self.sort_field,
            sort_order: self.sort_order,
            search: self.search,
        })
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))
    }
}
