//! Click event entity - One visit to a referral link. Append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Click event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "click_events")]
pub struct Model {
    /// Unique identifier for the click
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Shop whose referral link was visited
    pub referrer_shop_id: i64,
    /// Campaign tag, `None` for general (untagged) clicks
    pub campaign_slug: Option<String>,
    /// When the click was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ClickEvent` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each click belongs to the shop whose link was visited
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::ReferrerShopId",
        to = "super::shop_account::Column::Id"
    )]
    ReferrerShop,
}

impl Related<super::shop_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferrerShop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
