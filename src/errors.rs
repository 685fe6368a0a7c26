//! Unified error type for the engine.
//!
//! Every fallible operation returns [`Result`]. Click recording is the one write path
//! that never surfaces a domain error to the caller; only store failures propagate.

use crate::entities::commission_entry::CommissionStatus;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No shop account with this id
    #[error("Shop not found: {id}")]
    ShopNotFound {
        /// Requested shop id
        id: i64,
    },

    /// No product with this id
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// No campaign with this slug in the shop's registry
    #[error("Campaign '{slug}' not found for shop {shop_id}")]
    CampaignNotFound {
        /// Owning shop
        shop_id: i64,
        /// Requested slug
        slug: String,
    },

    /// No commission entry with this id
    #[error("Commission entry not found: {id}")]
    CommissionNotFound {
        /// Requested entry id
        id: i64,
    },

    /// No referral application with this id
    #[error("Referral application not found: {id}")]
    ApplicationNotFound {
        /// Requested application id
        id: i64,
    },

    /// Plan name missing from the catalog
    #[error("Plan not found: {name}")]
    PlanNotFound {
        /// Requested plan name
        name: String,
    },

    /// Creation refused because the shop is at its quota
    #[error("Quota exceeded: {current} of {quota} allowed")]
    QuotaExceeded {
        /// Resolved quota for the shop
        quota: i64,
        /// Live count of quota-consuming resources
        current: u64,
    },

    /// Commission status change not permitted by the lifecycle
    #[error("Invalid commission transition from {from} to {to}")]
    InvalidStateTransition {
        /// Status the entry was in when the change was attempted
        from: CommissionStatus,
        /// Requested status
        to: CommissionStatus,
    },

    /// Campaign slug already taken within the shop's registry
    #[error("Campaign slug '{slug}' already exists for shop {shop_id}")]
    DuplicateSlug {
        /// Owning shop
        shop_id: i64,
        /// Colliding slug
        slug: String,
    },

    /// Could not allocate a unique referral code
    #[error("Referral code '{code}' already exists")]
    DuplicateReferralCode {
        /// Last colliding code
        code: String,
    },

    /// Missing or malformed input
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
