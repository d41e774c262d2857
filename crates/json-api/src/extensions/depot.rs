//! Depot helper extensions.

use std::any::Any;

use bazaar_app::auth::Principal;
use salvo::prelude::{Depot, StatusError};

const PRINCIPAL_DEPOT_KEY: &str = "principal";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_principal(&mut self, principal: Principal);

    fn principal_or_401(&self) -> Result<Principal, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .ok()
            .ok_or_else(StatusError::internal_server_error)
    }

    fn insert_principal(&mut self, principal: Principal) {
        self.insert(PRINCIPAL_DEPOT_KEY, principal);
    }

    fn principal_or_401(&self) -> Result<Principal, StatusError> {
        self.get::<Principal>(PRINCIPAL_DEPOT_KEY)
            .ok()
            .copied()
            .ok_or_else(StatusError::unauthorized)
    }
}
