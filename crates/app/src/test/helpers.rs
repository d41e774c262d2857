//! Test Helpers

use bazaar_pricing::state::PriceBase;
use jiff::{Timestamp, ToSpan};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    auth::{Principal, Role},
    domain::{
        bundles::{
            BundlesService, BundlesServiceError,
            data::NewBundle,
            records::{BundleMember, BundleRecord, BundleUuid},
        },
        categories::{
            CategoriesService, CategoriesServiceError,
            data::NewCategory,
            records::{CategoryRecord, CategoryUuid},
        },
        discounts::{
            DiscountsService, DiscountsServiceError,
            data::NewDiscount,
            records::{DiscountRecord, DiscountUuid},
        },
        products::{
            ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{ProductRecord, ProductUuid},
        },
        sales::{
            SalesService, SalesServiceError,
            data::{NewSale, NewSaleCategory},
            records::{SaleRecord, SaleUuid},
        },
    },
    test::TestContext,
};

pub(crate) fn admin() -> Principal {
    Principal {
        uuid: Uuid::now_v7(),
        role: Role::Admin,
    }
}

pub(crate) async fn create_category(
    ctx: &TestContext,
    name: &str,
) -> Result<CategoryRecord, CategoriesServiceError> {
    ctx.categories
        .create_category(NewCategory {
            uuid: CategoryUuid::new(),
            name: name.to_string(),
            description: None,
        })
        .await
}

/// Create a product in a category of its own.
pub(crate) async fn create_product(
    ctx: &TestContext,
    mrp: Decimal,
    discount: Decimal,
) -> Result<ProductRecord, ProductsServiceError> {
    let category = create_category(ctx, &format!("Category {}", Uuid::now_v7()))
        .await
        .ok()
        .ok_or(ProductsServiceError::InvalidReference)?;

    ctx.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            category_uuid: category.uuid,
            name: "Product".to_string(),
            mrp,
            discount,
        })
        .await
}

pub(crate) async fn create_bundle(
    ctx: &TestContext,
    products: &[ProductUuid],
    discount: Decimal,
) -> Result<BundleRecord, BundlesServiceError> {
    ctx.bundles
        .create_bundle(NewBundle {
            uuid: BundleUuid::new(),
            name: "Bundle".to_string(),
            discount,
            products: products.iter().copied().map(BundleMember::single).collect(),
            created_by: admin(),
        })
        .await
}

/// Create a discount active for the next month.
pub(crate) async fn create_discount(
    ctx: &TestContext,
    discount: Decimal,
    kind: PriceBase,
) -> Result<DiscountRecord, DiscountsServiceError> {
    let now = Timestamp::now();

    ctx.discounts
        .create_discount(NewDiscount {
            uuid: DiscountUuid::new(),
            code: format!("CODE{}", Uuid::now_v7().simple()),
            start_date: now
                .checked_sub(1.hour())
                .ok()
                .ok_or(DiscountsServiceError::InvalidData)?,
            end_date: now
                .checked_add(720.hours())
                .ok()
                .ok_or(DiscountsServiceError::InvalidData)?,
            discount,
            kind,
        })
        .await
}

/// Create a sale running for the next month over the given products' categories.
pub(crate) async fn create_active_sale(
    ctx: &TestContext,
    categories: &[(&ProductRecord, u32)],
) -> Result<SaleRecord, SalesServiceError> {
    let now = Timestamp::now();

    ctx.sales
        .create_sale(NewSale {
            uuid: SaleUuid::new(),
            name: "Season".to_string(),
            description: None,
            start_date: now
                .checked_sub(1.hour())
                .ok()
                .ok_or(SalesServiceError::InvalidData)?,
            end_date: now
                .checked_add(720.hours())
                .ok()
                .ok_or(SalesServiceError::InvalidData)?,
            categories: categories
                .iter()
                .map(|(product, discount)| NewSaleCategory {
                    category_uuid: product.category_uuid,
                    discount: Decimal::from(*discount),
                })
                .collect(),
            created_by: admin(),
        })
        .await
}

/// Base column of the adjustment stored for an entity, read straight from storage.
pub(crate) async fn stored_adjustment_base(
    ctx: &TestContext,
    entity_uuid: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT base FROM price_adjustments WHERE entity_uuid = $1")
        .bind(entity_uuid)
        .fetch_optional(ctx.db.pool())
        .await
}
