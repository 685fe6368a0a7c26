//! Shop account business logic - Signup, lookup, and billing-driven plan changes.
//!
//! Each shop receives a unique referral code at signup. Plan fields are only ever
//! changed through [`apply_plan_change`], which is what billing events call.

use crate::{
    config::referrals::ReferralSettings,
    core::plan::{PlanCatalog, normalize_plan_name},
    entities::{PlanReference, ShopAccount, shop_account},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{Set, SqlErr, prelude::*};
use tracing::instrument;

/// Retrieves a shop by id.
///
/// # Errors
/// Returns `ShopNotFound` if no such shop exists, or a database error.
pub async fn get_shop<C>(db: &C, shop_id: i64) -> Result<shop_account::Model>
where
    C: ConnectionTrait,
{
    ShopAccount::find_by_id(shop_id)
        .one(db)
        .await?
        .ok_or(Error::ShopNotFound { id: shop_id })
}

/// Finds the shop owning a referral code, returning None if the code is unknown.
///
/// Codes are matched case-insensitively since they are typed into URLs by hand.
pub async fn find_shop_by_referral_code(
    db: &DatabaseConnection,
    referral_code: &str,
) -> Result<Option<shop_account::Model>> {
    ShopAccount::find()
        .filter(shop_account::Column::ReferralCode.eq(referral_code.trim().to_uppercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new shop on a catalog plan and allocates its referral code.
///
/// # Errors
/// Returns an error if:
/// - The shop name is empty or whitespace-only
/// - The plan name is not in the catalog
/// - No unique referral code could be generated within the configured attempts
/// - The database insert fails
#[instrument(skip(db, catalog, settings))]
pub async fn create_shop(
    db: &DatabaseConnection,
    catalog: &PlanCatalog,
    settings: &ReferralSettings,
    name: &str,
    plan_name: &str,
) -> Result<shop_account::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Shop name cannot be empty".to_string(),
        });
    }
    let plan = catalog.lookup(plan_name)?;

    let mut last_code = String::new();
    for attempt in 1..=settings.slug_attempts.max(1) {
        let code = generate_referral_code(settings.referral_code_length);
        if find_shop_by_referral_code(db, &code).await?.is_some() {
            tracing::debug!(attempt, %code, "Referral code collision, regenerating");
            last_code = code;
            continue;
        }

        let shop = shop_account::ActiveModel {
            name: Set(name.trim().to_string()),
            plan_name: Set(plan.name.clone()),
            plan_reference: Set(None),
            plan_expires_at: Set(None),
            referral_code: Set(code.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        match shop.insert(db).await {
            Ok(shop) => {
                tracing::info!(shop_id = shop.id, plan = %shop.plan_name, "Shop created");
                return Ok(shop);
            }
            // Lost a race with a concurrent signup for the same code
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                last_code = code;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::DuplicateReferralCode { code: last_code })
}

/// Records a billing event: replaces the shop's plan fields.
///
/// Without a valid `plan_reference` the `plan_name` must exist in the catalog; with one,
/// the reference is authoritative and the name is stored as given.
///
/// # Errors
/// Returns an error if the shop does not exist, the plan cannot be resolved, or the
/// database update fails.
#[instrument(skip(db, catalog, plan_reference))]
pub async fn apply_plan_change(
    db: &DatabaseConnection,
    catalog: &PlanCatalog,
    shop_id: i64,
    plan_name: &str,
    plan_reference: Option<PlanReference>,
    plan_expires_at: Option<DateTime<Utc>>,
) -> Result<shop_account::Model> {
    let has_reference = plan_reference
        .as_ref()
        .is_some_and(PlanReference::has_valid_id);
    let stored_name = if has_reference {
        normalize_plan_name(plan_name)
    } else {
        catalog.lookup(plan_name)?.name.clone()
    };

    let mut shop: shop_account::ActiveModel = get_shop(db, shop_id).await?.into();
    shop.plan_name = Set(stored_name);
    shop.plan_reference = Set(plan_reference);
    shop.plan_expires_at = Set(plan_expires_at);

    let shop = shop.update(db).await?;
    tracing::info!(shop_id, plan = %shop.plan_name, "Plan changed");
    Ok(shop)
}

/// Produces an uppercase alphanumeric code of the given length.
fn generate_referral_code(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(1))
        .map(|byte| char::from(byte).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::plan::{BUSINESS, FeatureFlags, PREMIUM, STARTER},
        test_utils::*,
    };
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_shop_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let catalog = PlanCatalog::default();
        let settings = ReferralSettings::default();

        let result = create_shop(&db, &catalog, &settings, "  ", STARTER).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_shop(&db, &catalog, &settings, "Shop", "gold").await;
        assert!(matches!(result.unwrap_err(), Error::PlanNotFound { name: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_shop_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let shop = create_test_shop(&db, "Candle Corner", "Business").await?;

        assert_eq!(shop.name, "Candle Corner");
        assert_eq!(shop.plan_name, BUSINESS);
        assert!(shop.plan_reference.is_none());
        assert!(shop.plan_expires_at.is_none());
        assert_eq!(shop.referral_code.len(), 8);
        assert!(shop.referral_code.chars().all(|c| c.is_ascii_alphanumeric()));

        Ok(())
    }

    #[tokio::test]
    async fn test_referral_codes_are_unique() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_shop(&db, "First", STARTER).await?;
        let second = create_test_shop(&db, "Second", STARTER).await?;

        assert_ne!(first.referral_code, second.referral_code);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_shop_by_referral_code() -> Result<()> {
        let db = setup_test_db().await?;
        let shop = create_test_shop(&db, "Lookup", STARTER).await?;

        let found = find_shop_by_referral_code(&db, &shop.referral_code.to_lowercase()).await?;
        assert_eq!(found.unwrap().id, shop.id);

        let missing = find_shop_by_referral_code(&db, "NOPE").await?;
        assert!(missing.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_shop_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_shop(&db, 404).await;
        assert!(matches!(result.unwrap_err(), Error::ShopNotFound { id: 404 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_plan_change() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = PlanCatalog::default();
        let shop = create_test_shop(&db, "Upgrader", STARTER).await?;
        let expires_at = Utc::now() + Duration::days(30);

        let upgraded =
            apply_plan_change(&db, &catalog, shop.id, PREMIUM, None, Some(expires_at)).await?;
        assert_eq!(upgraded.plan_name, PREMIUM);
        assert_eq!(
            upgraded.plan_expires_at.map(|t| t.timestamp()),
            Some(expires_at.timestamp())
        );

        // Persisted, including the JSON plan reference
        let reference = PlanReference {
            id: Some("custom-7".to_string()),
            name: "custom".to_string(),
            product_quota: 7,
            feature_flags: FeatureFlags::all(),
        };
        apply_plan_change(&db, &catalog, shop.id, "custom", Some(reference.clone()), None)
            .await?;
        let reloaded = get_shop(&db, shop.id).await?;
        assert_eq!(reloaded.plan_name, "custom");
        assert_eq!(reloaded.plan_reference, Some(reference));
        assert!(reloaded.plan_expires_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_plan_change_rejects_unknown_plan_without_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = PlanCatalog::default();
        let shop = create_test_shop(&db, "Downgrader", BUSINESS).await?;

        let result = apply_plan_change(&db, &catalog, shop.id, "custom", None, None).await;
        assert!(matches!(result.unwrap_err(), Error::PlanNotFound { name: _ }));

        // Unchanged
        assert_eq!(get_shop(&db, shop.id).await?.plan_name, BUSINESS);

        Ok(())
    }

    #[test]
    fn test_generate_referral_code_shape() {
        let code = generate_referral_code(12);
        assert_eq!(code.len(), 12);
        assert_eq!(code, code.to_uppercase());
    }
}
