//! Plan catalog - Static lookup table from plan name to entitlement bundle.
//!
//! The catalog is reference data: built once from the built-in defaults, optionally
//! overridden by operator configuration, and read-only afterwards. The three named plans
//! (`starter`, `business`, `premium`) are always present.

use crate::{
    config::plans::PlanConfig,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Name of the plan every unresolvable account degrades to.
pub const STARTER: &str = "starter";
/// Mid-tier plan name.
pub const BUSINESS: &str = "business";
/// Top-tier plan name.
pub const PREMIUM: &str = "premium";

/// Quota value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// A named capability a plan may grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Listings sort ahead of lower tiers
    PriorityListing,
    /// Access to the analytics dashboard
    Analytics,
    /// Eligible for homepage placement
    FeaturedHomepage,
    /// Shows the VIP badge on the storefront
    VipBadge,
    /// May recruit other shops through referral links
    AffiliateAccess,
}

impl Feature {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::PriorityListing,
        Self::Analytics,
        Self::FeaturedHomepage,
        Self::VipBadge,
        Self::AffiliateAccess,
    ];

    /// Configuration name of the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriorityListing => "priority_listing",
            Self::Analytics => "analytics",
            Self::FeaturedHomepage => "featured_homepage",
            Self::VipBadge => "vip_badge",
            Self::AffiliateAccess => "affiliate_access",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s.trim())
            .ok_or_else(|| Error::Config {
                message: format!("Unknown feature flag: {s}"),
            })
    }
}

/// The full set of capability switches for a plan.
///
/// Missing fields deserialize as `false`, so partial JSON snapshots stay readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    /// See [`Feature::PriorityListing`]
    pub priority_listing: bool,
    /// See [`Feature::Analytics`]
    pub analytics: bool,
    /// See [`Feature::FeaturedHomepage`]
    pub featured_homepage: bool,
    /// See [`Feature::VipBadge`]
    pub vip_badge: bool,
    /// See [`Feature::AffiliateAccess`]
    pub affiliate_access: bool,
}

impl FeatureFlags {
    /// No capabilities.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            priority_listing: false,
            analytics: false,
            featured_homepage: false,
            vip_badge: false,
            affiliate_access: false,
        }
    }

    /// Every capability.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            priority_listing: true,
            analytics: true,
            featured_homepage: true,
            vip_badge: true,
            affiliate_access: true,
        }
    }

    /// Builds a flag set with exactly the listed features enabled.
    #[must_use]
    pub fn from_features<I: IntoIterator<Item = Feature>>(features: I) -> Self {
        let mut flags = Self::none();
        for feature in features {
            flags.set(feature, true);
        }
        flags
    }

    /// Returns whether `feature` is enabled.
    #[must_use]
    pub const fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::PriorityListing => self.priority_listing,
            Feature::Analytics => self.analytics,
            Feature::FeaturedHomepage => self.featured_homepage,
            Feature::VipBadge => self.vip_badge,
            Feature::AffiliateAccess => self.affiliate_access,
        }
    }

    /// Switches a single feature on or off.
    pub fn set(&mut self, feature: Feature, on: bool) {
        match feature {
            Feature::PriorityListing => self.priority_listing = on,
            Feature::Analytics => self.analytics = on,
            Feature::FeaturedHomepage => self.featured_homepage = on,
            Feature::VipBadge => self.vip_badge = on,
            Feature::AffiliateAccess => self.affiliate_access = on,
        }
    }
}

/// A catalog entry: what a plan grants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDefinition {
    /// Lookup key, lowercase
    pub name: String,
    /// Name shown to shop owners
    pub display_name: String,
    /// Maximum non-rejected products, [`UNLIMITED`] for no limit
    pub product_quota: i64,
    /// Capabilities granted
    pub feature_flags: FeatureFlags,
}

impl PlanDefinition {
    /// Built-in `starter` plan: five products, no capabilities.
    #[must_use]
    pub fn starter() -> Self {
        Self {
            name: STARTER.to_string(),
            display_name: "Starter".to_string(),
            product_quota: 5,
            feature_flags: FeatureFlags::none(),
        }
    }

    /// Built-in `business` plan: twenty products, priority listing and analytics.
    #[must_use]
    pub fn business() -> Self {
        Self {
            name: BUSINESS.to_string(),
            display_name: "Business".to_string(),
            product_quota: 20,
            feature_flags: FeatureFlags::from_features([
                Feature::PriorityListing,
                Feature::Analytics,
            ]),
        }
    }

    /// Built-in `premium` plan: unlimited products, every capability.
    #[must_use]
    pub fn premium() -> Self {
        Self {
            name: PREMIUM.to_string(),
            display_name: "Premium".to_string(),
            product_quota: UNLIMITED,
            feature_flags: FeatureFlags::all(),
        }
    }

    /// Returns true when the plan places no limit on products.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.product_quota == UNLIMITED
    }
}

/// Lookup table of plan definitions keyed by lowercase name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: BTreeMap<String, PlanDefinition>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let plans = [
            PlanDefinition::starter(),
            PlanDefinition::business(),
            PlanDefinition::premium(),
        ]
        .into_iter()
        .map(|plan| (plan.name.clone(), plan))
        .collect();
        Self { plans }
    }
}

impl PlanCatalog {
    /// Builds the catalog from the defaults with operator overrides applied by name.
    ///
    /// An override replaces the whole definition of a plan with the same name; unknown
    /// names add new plans. The built-in plans cannot be removed.
    pub fn from_config(overrides: &[PlanConfig]) -> Result<Self> {
        let mut catalog = Self::default();
        for entry in overrides {
            let plan = entry.to_definition()?;
            tracing::debug!(
                plan = %plan.name,
                quota = plan.product_quota,
                "Applying plan override"
            );
            catalog.plans.insert(plan.name.clone(), plan);
        }
        Ok(catalog)
    }

    /// Looks up a plan by name. Matching ignores case and surrounding whitespace.
    pub fn lookup(&self, plan_name: &str) -> Result<&PlanDefinition> {
        self.plans
            .get(&normalize_plan_name(plan_name))
            .ok_or_else(|| Error::PlanNotFound {
                name: plan_name.to_string(),
            })
    }

    /// The definition every unresolvable account falls back to.
    #[must_use]
    pub fn starter(&self) -> PlanDefinition {
        self.plans
            .get(STARTER)
            .cloned()
            .unwrap_or_else(PlanDefinition::starter)
    }

    /// All plans, ordered by name.
    pub fn plans(&self) -> impl Iterator<Item = &PlanDefinition> {
        self.plans.values()
    }
}

/// Canonical form of a plan name used as the catalog key.
#[must_use]
pub fn normalize_plan_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_catalog_contains_named_plans() -> Result<()> {
        let catalog = PlanCatalog::default();

        let starter = catalog.lookup(STARTER)?;
        assert_eq!(starter.product_quota, 5);
        assert_eq!(starter.feature_flags, FeatureFlags::none());

        let business = catalog.lookup(BUSINESS)?;
        assert_eq!(business.product_quota, 20);
        assert!(business.feature_flags.priority_listing);
        assert!(business.feature_flags.analytics);
        assert!(!business.feature_flags.featured_homepage);
        assert!(!business.feature_flags.vip_badge);
        assert!(!business.feature_flags.affiliate_access);

        let premium = catalog.lookup(PREMIUM)?;
        assert!(premium.is_unlimited());
        assert_eq!(premium.feature_flags, FeatureFlags::all());

        Ok(())
    }

    #[test]
    fn test_lookup_is_case_insensitive() -> Result<()> {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.lookup("  Business ")?.name, BUSINESS);
        Ok(())
    }

    #[test]
    fn test_lookup_unknown_plan() {
        let catalog = PlanCatalog::default();
        let result = catalog.lookup("enterprise");
        assert!(matches!(result, Err(Error::PlanNotFound { name }) if name == "enterprise"));
    }

    #[test]
    fn test_from_config_overrides_and_extends() -> Result<()> {
        let overrides = vec![
            PlanConfig {
                name: "Starter".to_string(),
                display_name: None,
                product_quota: 3,
                features: vec!["analytics".to_string()],
            },
            PlanConfig {
                name: "enterprise".to_string(),
                display_name: Some("Enterprise".to_string()),
                product_quota: UNLIMITED,
                features: vec!["vip_badge".to_string(), "affiliate_access".to_string()],
            },
        ];

        let catalog = PlanCatalog::from_config(&overrides)?;

        let starter = catalog.lookup(STARTER)?;
        assert_eq!(starter.product_quota, 3);
        assert!(starter.feature_flags.analytics);
        assert_eq!(catalog.starter(), starter.clone());

        let enterprise = catalog.lookup("enterprise")?;
        assert_eq!(enterprise.display_name, "Enterprise");
        assert!(enterprise.feature_flags.enabled(Feature::VipBadge));
        assert!(!enterprise.feature_flags.enabled(Feature::Analytics));

        // Untouched defaults survive
        assert_eq!(catalog.lookup(BUSINESS)?.product_quota, 20);
        assert_eq!(catalog.plans().count(), 4);

        Ok(())
    }

    #[test]
    fn test_feature_round_trips_through_name() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), feature);
        }
        assert!("teleport".parse::<Feature>().is_err());
    }
}
