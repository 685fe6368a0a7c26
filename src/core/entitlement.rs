//! Entitlement resolution - What a shop account is allowed to do.
//!
//! Every caller that needs a quota, a feature flag or a plan display name goes through
//! [`resolve`], so all three share one precedence rule:
//!
//! 1. An embedded plan reference with a valid id is authoritative and used verbatim.
//! 2. Otherwise the account's `plan_name` is looked up in the [`PlanCatalog`].
//! 3. Otherwise the catalog's `starter` definition applies.
//!
//! Sources are never mixed. Expiry is deliberately not part of resolution; see
//! [`effective_entitlement`] for the policy callers use when it matters.

use crate::{
    core::plan::{Feature, FeatureFlags, PlanCatalog, PlanDefinition, UNLIMITED},
    entities::shop_account,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which rule produced a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementSource {
    /// The account's embedded plan reference
    Reference,
    /// Catalog lookup of the account's plan name
    Catalog,
    /// Starter defaults for an unknown or missing plan
    Fallback,
    /// Starter defaults because the plan has lapsed
    Expired,
}

/// The resolved `{quota, flags}` for an account at a point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntitlementBundle {
    /// Plan the bundle was taken from
    pub plan_name: String,
    /// Name shown to shop owners
    pub display_name: String,
    /// Maximum non-rejected products, `-1` for unlimited
    pub quota: i64,
    /// Granted capabilities
    pub flags: FeatureFlags,
    /// Rule that produced the bundle
    pub source: EntitlementSource,
}

impl EntitlementBundle {
    fn from_definition(plan: PlanDefinition, source: EntitlementSource) -> Self {
        Self {
            plan_name: plan.name,
            display_name: plan.display_name,
            quota: plan.product_quota,
            flags: plan.feature_flags,
            source,
        }
    }

    /// Returns true when the quota is unlimited.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.quota == UNLIMITED
    }

    /// Returns whether the bundle grants `feature`.
    #[must_use]
    pub const fn has_feature(&self, feature: Feature) -> bool {
        self.flags.enabled(feature)
    }
}

/// Resolves the entitlement bundle for an account.
///
/// Never fails. An account with neither a valid plan reference nor a recognised plan
/// name degrades to the starter defaults, which is logged at `warn`.
#[must_use]
pub fn resolve(catalog: &PlanCatalog, account: &shop_account::Model) -> EntitlementBundle {
    if let Some(reference) = account
        .plan_reference
        .as_ref()
        .filter(|reference| reference.has_valid_id())
    {
        let display_name = catalog
            .lookup(&reference.name)
            .map_or_else(|_| reference.name.clone(), |plan| plan.display_name.clone());
        return EntitlementBundle {
            plan_name: reference.name.clone(),
            display_name,
            quota: reference.product_quota,
            flags: reference.feature_flags,
            source: EntitlementSource::Reference,
        };
    }

    if let Ok(plan) = catalog.lookup(&account.plan_name) {
        return EntitlementBundle::from_definition(plan.clone(), EntitlementSource::Catalog);
    }

    tracing::warn!(
        shop_id = account.id,
        plan_name = %account.plan_name,
        "No valid plan reference or known plan name, falling back to starter"
    );
    EntitlementBundle::from_definition(catalog.starter(), EntitlementSource::Fallback)
}

/// Returns true when the account's plan has lapsed at `now`.
#[must_use]
pub fn is_plan_expired(account: &shop_account::Model, now: DateTime<Utc>) -> bool {
    account.plan_expires_at.is_some_and(|expires_at| expires_at < now)
}

/// Resolves the entitlement a caller should enforce, taking expiry into account.
///
/// An expired account is treated as a starter account. Unexpired accounts get exactly
/// what [`resolve`] returns.
#[must_use]
pub fn effective_entitlement(
    catalog: &PlanCatalog,
    account: &shop_account::Model,
    now: DateTime<Utc>,
) -> EntitlementBundle {
    if is_plan_expired(account, now) {
        tracing::debug!(shop_id = account.id, "Plan expired, enforcing starter entitlement");
        return EntitlementBundle::from_definition(catalog.starter(), EntitlementSource::Expired);
    }
    resolve(catalog, account)
}

/// Convenience check for a single capability.
#[must_use]
pub fn has_feature(catalog: &PlanCatalog, account: &shop_account::Model, feature: Feature) -> bool {
    resolve(catalog, account).has_feature(feature)
}
