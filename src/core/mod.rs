//! Core business logic, independent of any front end.
//!
//! Entitlements flow `plan` -> `entitlement` -> `quota`, with `product` as the quota's
//! caller. Attribution flows `campaign` -> `ledger` -> `aggregate`.

/// Dashboard rollups of referral activity
pub mod aggregate;
/// Shop-owned campaign registry
pub mod campaign;
/// Entitlement resolution for shop accounts
pub mod entitlement;
/// Clicks, conversions and commission lifecycle
pub mod ledger;
/// Plan catalog and feature flags
pub mod plan;
/// Quota-bound product creation and moderation
pub mod product;
/// Quota admission checks
pub mod quota;
/// Shop signup and plan changes
pub mod shop;
