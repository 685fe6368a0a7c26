//! Product entity - A listing owned by a shop.
//!
//! Products are the quota-bound resource: every product whose status is not
//! `rejected` counts against the owning shop's plan quota.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a product listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Awaiting moderation
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Live on the storefront
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Refused by moderation; does not consume quota
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ProductStatus {
    /// Whether a product in this status counts against the shop's quota.
    #[must_use]
    pub const fn consumes_quota(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning shop
    pub shop_id: i64,
    /// Listing title
    pub name: String,
    /// Moderation status
    pub status: ProductStatus,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one shop
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
