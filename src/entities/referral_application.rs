//! Referral application entity - A completed signup, optionally attributed to a referrer.
//!
//! Append-only. A null `referred_by_shop_id` marks an organic signup.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral application database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_applications")]
pub struct Model {
    /// Unique identifier for the application
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Shop that signed up
    pub referred_shop_id: i64,
    /// Referring shop, `None` for organic signups
    pub referred_by_shop_id: Option<i64>,
    /// Campaign tag carried through from the referral link
    pub campaign_slug: Option<String>,
    /// When the application was recorded
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Returns true when the signup is attributed to a referring shop.
    #[must_use]
    pub const fn is_attributed(&self) -> bool {
        self.referred_by_shop_id.is_some()
    }
}

/// Defines relationships between `ReferralApplication` and shops
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The shop that signed up
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::ReferredShopId",
        to = "super::shop_account::Column::Id"
    )]
    ReferredShop,
    /// The referring shop, when attributed
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::ReferredByShopId",
        to = "super::shop_account::Column::Id"
    )]
    ReferredByShop,
}

impl ActiveModelBehavior for ActiveModel {}
