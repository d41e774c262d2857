//! Test helpers.

use std::sync::Arc;

use bazaar_app::{
    auth::{MockAuthService, Principal, Role},
    context::AppContext,
    domain::{
        bundles::MockBundlesService, categories::MockCategoriesService,
        discounts::MockDiscountsService, products::MockProductsService, sales::MockSalesService,
    },
};
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_ADMIN: Principal = Principal {
    uuid: Uuid::nil(),
    role: Role::Admin,
};

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(TEST_ADMIN);
    ctrl.call_next(req, depot, res).await;
}

/// Services with no expectations; any call fails the test.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) auth: MockAuthService,
    pub(crate) categories: MockCategoriesService,
    pub(crate) products: MockProductsService,
    pub(crate) bundles: MockBundlesService,
    pub(crate) discounts: MockDiscountsService,
    pub(crate) sales: MockSalesService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            auth: Arc::new(self.auth),
            categories: Arc::new(self.categories),
            products: Arc::new(self.products),
            bundles: Arc::new(self.bundles),
            discounts: Arc::new(self.discounts),
            sales: Arc::new(self.sales),
        })
    }

    /// Serve `route` as an authenticated admin.
    pub(crate) fn service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_admin)
                .push(route),
        )
    }
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    Mocks {
        auth,
        ..Mocks::default()
    }
    .into_state()
}

pub(crate) fn categories_service(categories: MockCategoriesService, route: Router) -> Service {
    Mocks {
        categories,
        ..Mocks::default()
    }
    .service(route)
}

pub(crate) fn products_service(products: MockProductsService, route: Router) -> Service {
    Mocks {
        products,
        ..Mocks::default()
    }
    .service(route)
}

pub(crate) fn bundles_service(bundles: MockBundlesService, route: Router) -> Service {
    Mocks {
        bundles,
        ..Mocks::default()
    }
    .service(route)
}

pub(crate) fn discounts_service(discounts: MockDiscountsService, route: Router) -> Service {
    Mocks {
        discounts,
        ..Mocks::default()
    }
    .service(route)
}

pub(crate) fn sales_service(sales: MockSalesService, route: Router) -> Service {
    Mocks {
        sales,
        ..Mocks::default()
    }
    .service(route)
}
