//! Product business logic - Quota-bound listing creation and moderation.
//!
//! Products are the resource plans meter. Quota consumption is the count of a shop's
//! products whose status is not `rejected`, recomputed from the store on every call.
//! [`create_product`] is the caller the quota guard exists for: it reads the live count,
//! asks the guard, then inserts. Two concurrent creations for the same shop can both
//! pass the check; the store would need a constraint to close that gap.

use crate::{
    core::{entitlement, plan::PlanCatalog, quota, shop},
    entities::{Product, ProductStatus, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::instrument;

/// Counts the shop's products that consume quota (status other than `rejected`).
pub async fn count_active_products<C>(db: &C, shop_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::ShopId.eq(shop_id))
        .filter(product::Column::Status.ne(ProductStatus::Rejected))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all of a shop's products, newest first.
pub async fn list_products(db: &DatabaseConnection, shop_id: i64) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::ShopId.eq(shop_id))
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new `pending` product if the shop's entitlement admits it.
///
/// An expired plan is enforced as starter (see [`entitlement::effective_entitlement`]).
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The shop does not exist
/// - The shop is at its quota (`QuotaExceeded`)
/// - The database insert fails
#[instrument(skip(db, catalog))]
pub async fn create_product(
    db: &DatabaseConnection,
    catalog: &PlanCatalog,
    shop_id: i64,
    name: &str,
) -> Result<product::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }

    let account = shop::get_shop(db, shop_id).await?;
    let now = Utc::now();
    let bundle = entitlement::effective_entitlement(catalog, &account, now);
    let current = count_active_products(db, shop_id).await?;

    if !quota::allows(bundle.quota, current) {
        tracing::info!(shop_id, quota = bundle.quota, current, "Product creation refused");
        return Err(Error::QuotaExceeded {
            quota: bundle.quota,
            current,
        });
    }

    let product = product::ActiveModel {
        shop_id: Set(shop_id),
        name: Set(name.trim().to_string()),
        status: Set(ProductStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Moves a product to a new moderation status.
///
/// Any status may follow any other; rejecting a product frees its quota slot and
/// re-approving it consumes one again.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist, or a database error.
#[instrument(skip(db))]
pub async fn set_product_status(
    db: &DatabaseConnection,
    product_id: i64,
    status: ProductStatus,
) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.status = Set(status);
    product.updated_at = Set(Utc::now());

    product.update(db).await.map_err(Into::into)
}
