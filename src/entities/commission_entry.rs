//! Commission entry entity - Money owed to a referring shop.
//!
//! Entries move through `pending -> approved -> paid`, with `cancelled` reachable from
//! `pending` or `approved`. `paid` and `cancelled` are terminal.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a commission entry
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Created, awaiting review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted for payout
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Settled by the payment processor
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Voided
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl CommissionStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Paid, Self::Cancelled];

    /// Returns true when `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Cancelled)
                | (Self::Approved, Self::Paid | Self::Cancelled)
        )
    }

    /// Returns true for statuses no entry ever leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commission entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Referring shop that earns the commission
    pub earning_shop_id: i64,
    /// Shop whose signup produced the commission
    pub referred_shop_id: i64,
    /// Campaign tag of the conversion that produced the entry
    pub campaign_slug: Option<String>,
    /// Commission amount in dollars
    pub amount: f64,
    /// Current lifecycle status
    pub status: CommissionStatus,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub status_changed_at: DateTimeUtc,
}

/// Defines relationships between `CommissionEntry` and shops
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Shop the commission is owed to
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::EarningShopId",
        to = "super::shop_account::Column::Id"
    )]
    EarningShop,
    /// Shop whose signup produced the commission
    #[sea_orm(
        belongs_to = "super::shop_account::Entity",
        from = "Column::ReferredShopId",
        to = "super::shop_account::Column::Id"
    )]
    ReferredShop,
}

impl ActiveModelBehavior for ActiveModel {}
