//! Shop account entity - A storefront on the marketplace.
//!
//! Holds the subscription fields read by entitlement resolution (`plan_name`,
//! `plan_reference`, `plan_expires_at`) and the `referral_code` used as the
//! attribution key in referral links. Plan fields are mutated by billing events.

use crate::core::plan::FeatureFlags;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shop account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_accounts")]
pub struct Model {
    /// Unique identifier for the shop
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Storefront display name
    pub name: String,
    /// Subscription plan name (`"starter"`, `"business"` or `"premium"`)
    pub plan_name: String,
    /// Explicitly linked plan snapshot; authoritative when it carries an id
    #[sea_orm(column_type = "Json", nullable)]
    pub plan_reference: Option<PlanReference>,
    /// When the current plan lapses; `None` means no expiry
    pub plan_expires_at: Option<DateTimeUtc>,
    /// Attribution key used in referral links
    #[sea_orm(unique)]
    pub referral_code: String,
    /// When the shop signed up
    pub created_at: DateTimeUtc,
}

/// Plan snapshot embedded on an account by the billing system.
///
/// Stored as JSON. Only honoured when `id` is present and non-blank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct PlanReference {
    /// Catalog or billing identifier of the linked plan
    pub id: Option<String>,
    /// Plan name as known to billing
    pub name: String,
    /// Product quota, `-1` for unlimited
    pub product_quota: i64,
    /// Capabilities granted by the plan
    #[serde(default)]
    pub feature_flags: FeatureFlags,
}

impl PlanReference {
    /// Returns true when the reference carries a usable identifier.
    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

/// Defines relationships between `ShopAccount` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One shop owns many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// One shop owns many campaigns
    #[sea_orm(has_many = "super::campaign::Entity")]
    Campaigns,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
