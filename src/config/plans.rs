//! Plan overrides loaded from config.toml
//!
//! Operators may retune the built-in plans or add new ones without a release. Each
//! `[[plans]]` table replaces the catalog entry with the same name.

use crate::{
    core::plan::{Feature, FeatureFlags, PlanDefinition, UNLIMITED, normalize_plan_name},
    errors::{Error, Result},
};
use serde::Deserialize;

/// Configuration for a single plan
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PlanConfig {
    /// Plan name used as the lookup key (case-insensitive)
    pub name: String,
    /// Name shown to shop owners; defaults to the plan name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Maximum non-rejected products, `-1` for unlimited
    pub product_quota: i64,
    /// Enabled capability names (e.g. `"analytics"`, `"vip_badge"`)
    #[serde(default)]
    pub features: Vec<String>,
}

impl PlanConfig {
    /// Validates the entry and converts it into a catalog definition.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The name is empty or whitespace-only
    /// - The quota is below `-1`
    /// - A feature name is not recognised
    pub fn to_definition(&self) -> Result<PlanDefinition> {
        let name = normalize_plan_name(&self.name);
        if name.is_empty() {
            return Err(Error::Config {
                message: "Plan name cannot be empty".to_string(),
            });
        }

        if self.product_quota < UNLIMITED {
            return Err(Error::Config {
                message: format!(
                    "Plan '{name}' has invalid product_quota {}; use -1 for unlimited",
                    self.product_quota
                ),
            });
        }

        let features = self
            .features
            .iter()
            .map(|feature| feature.parse::<Feature>())
            .collect::<Result<Vec<_>>>()?;

        Ok(PlanDefinition {
            display_name: self.display_name.clone().unwrap_or_else(|| name.clone()),
            name,
            product_quota: self.product_quota,
            feature_flags: FeatureFlags::from_features(features),
        })
    }
}
