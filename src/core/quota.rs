//! Quota guard - Admission check for quota-limited resource creation.
//!
//! The guard is pure: callers supply the live count of non-rejected resources and get
//! a yes/no answer. Check-then-create is racy under concurrent creation by the same
//! shop; exact enforcement needs an atomic counter or a constraint in the store.

use crate::{
    core::{entitlement, plan::PlanCatalog},
    entities::shop_account,
};

/// Returns whether an account with `current_active_count` resources may create another.
#[must_use]
pub fn can_create(
    catalog: &PlanCatalog,
    account: &shop_account::Model,
    current_active_count: u64,
) -> bool {
    let bundle = entitlement::resolve(catalog, account);
    allows(bundle.quota, current_active_count)
}

/// Applies a resolved quota to a live count.
#[must_use]
pub fn allows(quota: i64, current_active_count: u64) -> bool {
    if quota == crate::core::plan::UNLIMITED {
        return true;
    }
    // Negative quotas other than unlimited admit nothing
    u64::try_from(quota).is_ok_and(|limit| current_active_count < limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::plan::{BUSINESS, PREMIUM, STARTER},
        test_utils::account_with_plan,
    };

    #[test]
    fn test_unlimited_always_admits() {
        let catalog = PlanCatalog::default();
        let account = account_with_plan(PREMIUM, None);
        for count in [0, 1, 1_000, u64::MAX] {
            assert!(can_create(&catalog, &account, count));
        }
    }

    #[test]
    fn test_starter_quota_boundary() {
        let catalog = PlanCatalog::default();
        let account = account_with_plan(STARTER, None);
        assert!(can_create(&catalog, &account, 0));
        assert!(can_create(&catalog, &account, 4));
        assert!(!can_create(&catalog, &account, 5));
        assert!(!can_create(&catalog, &account, 6));
    }

    #[test]
    fn test_business_quota_boundary() {
        let catalog = PlanCatalog::default();
        let account = account_with_plan(BUSINESS, None);
        assert!(can_create(&catalog, &account, 19));
        assert!(!can_create(&catalog, &account, 20));
    }

    #[test]
    fn test_zero_and_invalid_quotas_admit_nothing() {
        assert!(!allows(0, 0));
        assert!(!allows(-5, 0));
    }
}
