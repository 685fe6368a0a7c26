//! Campaign entity - A shop-owned tag attached to referral links.
//!
//! The slug is unique within the owning shop's registry (enforced by a composite
//! unique index created alongside the table). Campaigns are deleted, never re-slugged.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Campaign database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning shop
    pub shop_id: i64,
    /// URL tag, unique per shop
    pub slug: String,
    /// Human label the slug was generated from
    pub label: String,
    /// When the campaign was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Campaign and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each campaign belongs to one shop
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::ShopId",
        to = "super::shop_account::Column::Id"
    )]
    ShopAccount,
}

impl Related<super::shop_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
