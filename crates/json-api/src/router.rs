//! App Router

use salvo::Router;

use crate::{auth, bundles, categories, discounts, products, sales};

/// Admin routes; every request must carry an admin bearer token.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("categories")
                .get(categories::index::handler)
                .post(categories::create::handler)
                .push(
                    Router::with_path("{category}")
                        .get(categories::get::handler)
                        .put(categories::update::handler)
                        .delete(categories::delete::handler),
                ),
        )
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .post(products::create::handler)
                .push(
                    Router::with_path("{product}")
                        .get(products::get::handler)
                        .push(Router::with_path("block").put(products::block::handler))
                        .push(Router::with_path("unblock").put(products::unblock::handler)),
                ),
        )
        .push(
            Router::with_path("bundles")
                .get(bundles::index::handler)
                .post(bundles::create::handler)
                .push(
                    Router::with_path("{bundle}")
                        .get(bundles::get::handler)
                        .put(bundles::update::handler)
                        .delete(bundles::delete::handler)
                        .push(
                            Router::with_path("products")
                                .post(bundles::members::add)
                                .delete(bundles::members::remove),
                        ),
                ),
        )
        .push(
            Router::with_path("discounts")
                .get(discounts::index::handler)
                .post(discounts::create::handler)
                .push(
                    Router::with_path("{discount}")
                        .get(discounts::get::handler)
                        .delete(discounts::delete::handler)
                        .push(Router::with_path("apply").post(discounts::apply::handler))
                        .push(Router::with_path("remove").post(discounts::remove::handler)),
                ),
        )
        .push(
            Router::with_path("sales")
                .get(sales::index::handler)
                .post(sales::create::handler)
                .push(
                    Router::with_path("{sale}")
                        .get(sales::get::handler)
                        .delete(sales::delete::handler)
                        .push(
                            Router::with_path("products")
                                .post(sales::products::enroll)
                                .delete(sales::products::withdraw),
                        )
                        .push(
                            Router::with_path("bundles")
                                .post(sales::bundles::enroll)
                                .delete(sales::bundles::withdraw),
                        )
                        .push(Router::with_path("sync").post(sales::sync::handler)),
                ),
        )
}
