//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::referrals::ReferralSettings,
    core::{ledger, plan::PlanCatalog, shop},
    entities::{self, PlanReference},
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds an unsaved shop account for pure entitlement tests.
///
/// # Defaults
/// * `id`: 1
/// * `plan_expires_at`: None
/// * `referral_code`: `"TESTCODE"`
#[must_use]
pub fn account_with_plan(
    plan_name: &str,
    plan_reference: Option<PlanReference>,
) -> entities::shop_account::Model {
    entities::shop_account::Model {
        id: 1,
        name: "Test Shop".to_string(),
        plan_name: plan_name.to_string(),
        plan_reference,
        plan_expires_at: None,
        referral_code: "TESTCODE".to_string(),
        created_at: Utc::now(),
    }
}

/// Creates a shop with the default catalog and referral settings.
pub async fn create_test_shop(
    db: &DatabaseConnection,
    name: &str,
    plan_name: &str,
) -> Result<entities::shop_account::Model> {
    shop::create_shop(
        db,
        &PlanCatalog::default(),
        &ReferralSettings::default(),
        name,
        plan_name,
    )
    .await
}

/// Sets up a complete test environment with one shop.
/// Returns (db, shop) for common test scenarios.
pub async fn setup_with_shop(
    plan_name: &str,
) -> Result<(DatabaseConnection, entities::shop_account::Model)> {
    let db = setup_test_db().await?;
    let shop = create_test_shop(&db, "Test Shop", plan_name).await?;
    Ok((db, shop))
}

/// Sets up a referrer, a referred shop, and one untagged `pending` commission.
/// Returns (db, entry) for commission lifecycle tests.
pub async fn setup_with_commission(
    amount: f64,
) -> Result<(DatabaseConnection, entities::commission_entry::Model)> {
    let (db, referrer) = setup_with_shop(crate::core::plan::STARTER).await?;
    let referred = create_test_shop(&db, "Referred Shop", crate::core::plan::STARTER).await?;
    ledger::record_conversion(&db, referred.id, Some(referrer.id), None).await?;
    let entry = ledger::create_commission(&db, referrer.id, referred.id, None, amount).await?;
    Ok((db, entry))
}
